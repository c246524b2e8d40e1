//! Currency parsing provider
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use async_trait::async_trait;
use jst_core::coerce::number_value;
use jst_core::{ExecutionContext, FieldSpec, FieldType, Provider, ProviderDescriptor};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Collection tag of [`CurrencyParse`]
pub const CURRENCY_COLLECTION: &str = "Currency";

/// Option block read by [`CurrencyParse`]
pub const CURRENCY_BLOCK: &str = "currency";

static PARENTHESIZED: OnceLock<Regex> = OnceLock::new();

fn parenthesized() -> &'static Regex {
    PARENTHESIZED.get_or_init(|| Regex::new(r"^\s*\((.*)\)\s*$").expect("parenthesized pattern is valid"))
}

/// How amounts are written in the source data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrencyFormat {
    pub symbol: String,
    /// Grouping separator
    pub separator: String,
    /// Decimal mark
    pub decimal: String,
    /// Digits kept after rounding
    pub precision: u32,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            separator: ",".to_string(),
            decimal: ".".to_string(),
            precision: 2,
        }
    }
}

impl CurrencyFormat {
    /// Read the `currency` option: `true` for defaults or an object of overrides
    pub fn from_option(option: &Value) -> anyhow::Result<Option<Self>> {
        match option {
            Value::Bool(true) => Ok(Some(Self::default())),
            Value::Object(_) => Ok(Some(serde_json::from_value(option.clone())?)),
            _ => Ok(None),
        }
    }

    /// Parse an amount, rounding to `precision`; unparseable input is zero
    pub fn parse(&self, value: &Value) -> f64 {
        let amount = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => self.parse_str(s),
            _ => 0.0,
        };
        self.round(amount)
    }

    fn parse_str(&self, input: &str) -> f64 {
        let (negative, body) = match parenthesized().captures(input) {
            Some(caps) => (true, caps.get(1).map_or("", |m| m.as_str()).to_string()),
            None => (false, input.to_string()),
        };

        let mut cleaned = body;
        for noise in [&self.symbol, &self.separator] {
            if !noise.is_empty() && noise != &self.decimal {
                cleaned = cleaned.replace(noise.as_str(), "");
            }
        }
        if !self.decimal.is_empty() && self.decimal != "." {
            cleaned = cleaned.replace(self.decimal.as_str(), ".");
        }
        let cleaned: String = cleaned
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        let amount = cleaned.parse::<f64>().unwrap_or(0.0);
        if negative {
            -amount.abs()
        } else {
            amount
        }
    }

    fn round(&self, amount: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        (amount * factor).round() / factor
    }
}

/// Turns formatted money amounts into numbers for `number` fields
#[derive(Debug, Clone)]
pub struct CurrencyParse {
    descriptor: ProviderDescriptor,
}

impl CurrencyParse {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("CurrencyParse").in_collection(CURRENCY_COLLECTION),
        }
    }
}

impl Default for CurrencyParse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for CurrencyParse {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, _value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        ctx.field.field_type == Some(FieldType::Number)
            && ctx
                .options
                .raw_block(CURRENCY_BLOCK)
                .is_some_and(|option| option.is_object() || option.as_bool() == Some(true))
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(current) = value else {
            return Ok(None);
        };
        let Some(format) = ctx
            .options
            .raw_block(CURRENCY_BLOCK)
            .map(CurrencyFormat::from_option)
            .transpose()?
            .flatten()
        else {
            return Ok(Some(current));
        };

        Ok(number_value(format.parse(&current)).or(Some(Value::from(0))))
    }
}
