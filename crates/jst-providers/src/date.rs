//! Date parsing provider
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use jst_core::provider::is_truthy;
use jst_core::{ExecutionContext, FieldSpec, FieldType, Provider, ProviderDescriptor};
use serde_json::Value;
use tracing::debug;

/// Collection tag of [`DateParse`]
pub const DATE_COLLECTION: &str = "Date";

const DATE_FORMATS: [&str; 3] = ["date", "time", "date-time"];

/// Normalizes date-like values of `date`, `time`, and `date-time` string fields
///
/// Numbers are epoch milliseconds. Strings are read with the `format` option
/// (a chrono strftime pattern) when one is set, else as RFC 3339, ISO
/// date-time, or ISO date. Parsed values are emitted as RFC 3339 UTC with
/// millisecond precision; anything unparseable passes through untouched.
#[derive(Debug, Clone)]
pub struct DateParse {
    descriptor: ProviderDescriptor,
}

impl DateParse {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("DateParse").in_collection(DATE_COLLECTION),
        }
    }
}

impl Default for DateParse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for DateParse {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        is_truthy(value)
            && ctx.field.field_type == Some(FieldType::String)
            && ctx
                .field
                .format
                .as_deref()
                .is_some_and(|format| DATE_FORMATS.contains(&format))
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

        match parse_date(&current, ctx.options.format.as_deref()) {
            Some(parsed) => Ok(Some(Value::String(parsed.to_rfc3339_opts(SecondsFormat::Millis, true)))),
            None => {
                debug!(field = ctx.target_key, "value is not a recognizable date");
                Ok(Some(current))
            }
        }
    }
}

/// Interpret a JSON value as a UTC instant
pub fn parse_date(value: &Value, format: Option<&str>) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => match format {
            Some(format) => parse_with_format(s.trim(), format),
            None => parse_iso(s.trim()),
        },
        _ => None,
    }
}

fn parse_with_format(input: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_str(input, format) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_iso(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
