//! Enum value lookup
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use super::ENUM_COLLECTION;
use crate::context::ExecutionContext;
use crate::provider::{Provider, ProviderDescriptor};
use crate::schema::FieldSpec;
use async_trait::async_trait;
use serde_json::Value;

/// Maps a string value through the field's `dictionary`
///
/// Unmapped values become no value.
#[derive(Debug, Clone)]
pub struct EnumDictionary {
    descriptor: ProviderDescriptor,
}

impl EnumDictionary {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("EnumDictionary").in_collection(ENUM_COLLECTION),
        }
    }
}

impl Default for EnumDictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for EnumDictionary {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        ctx.options.dictionary.is_some() && matches!(value, Some(Value::String(_)))
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(dictionary) = &ctx.options.dictionary else {
            return Ok(value);
        };
        Ok(match value {
            Some(Value::String(key)) => dictionary.get(&key).filter(|v| !v.is_null()).cloned(),
            other => other,
        })
    }
}
