//! String cleanup providers
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use super::STRING_COLLECTION;
use crate::coerce::number_string;
use crate::context::ExecutionContext;
use crate::provider::{Provider, ProviderDescriptor};
use crate::schema::FieldSpec;
use async_trait::async_trait;
use serde_json::Value;

fn non_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.is_empty())
}

fn replacement_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_string(n),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replaces every occurrence of each `replace` key by its value
///
/// Replacements apply one after another in declaration order, so a later
/// key sees the output of the earlier ones.
#[derive(Debug, Clone)]
pub struct StringReplace {
    descriptor: ProviderDescriptor,
}

impl StringReplace {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("StringReplace").in_collection(STRING_COLLECTION),
        }
    }
}

impl Default for StringReplace {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for StringReplace {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        ctx.options.replace.is_some() && non_empty_string(value)
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(replace) = &ctx.options.replace else {
            return Ok(value);
        };

        Ok(match value {
            Some(Value::String(text)) => {
                let replaced = replace
                    .iter()
                    .filter(|(pattern, _)| !pattern.is_empty())
                    .fold(text, |acc, (pattern, by)| {
                        acc.replace(pattern.as_str(), &replacement_text(by))
                    });
                Some(Value::String(replaced))
            }
            other => other,
        })
    }
}

/// Removes every occurrence of each `clean` entry
#[derive(Debug, Clone)]
pub struct StringClean {
    descriptor: ProviderDescriptor,
}

impl StringClean {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("StringClean").in_collection(STRING_COLLECTION),
        }
    }
}

impl Default for StringClean {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for StringClean {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        ctx.options.clean.is_some() && non_empty_string(value)
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(clean) = &ctx.options.clean else {
            return Ok(value);
        };

        Ok(match value {
            Some(Value::String(text)) => {
                let cleaned = clean
                    .iter()
                    .filter(|pattern| !pattern.is_empty())
                    .fold(text, |acc, pattern| acc.replace(pattern.as_str(), ""));
                Some(Value::String(cleaned))
            }
            other => other,
        })
    }
}
