//! Array element selection
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use super::ARRAY_COLLECTION;
use crate::context::ExecutionContext;
use crate::provider::{Provider, ProviderDescriptor};
use crate::schema::FieldSpec;
use async_trait::async_trait;
use serde_json::Value;

/// Picks the element at `arrayIndex` out of an array value
///
/// An out-of-range index or a `null` element yields no value. Non-array
/// values pass through untouched.
#[derive(Debug, Clone)]
pub struct ArrayIndex {
    descriptor: ProviderDescriptor,
}

impl ArrayIndex {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("ArrayIndex").in_collection(ARRAY_COLLECTION),
        }
    }
}

impl Default for ArrayIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for ArrayIndex {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        ctx.options.array_index.is_some() && matches!(value, Some(Value::Array(_)))
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(index) = ctx.options.array_index else {
            return Ok(value);
        };
        Ok(match value {
            Some(Value::Array(mut items)) if index < items.len() => {
                Some(items.swap_remove(index)).filter(|v| !v.is_null())
            }
            Some(Value::Array(_)) => None,
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslationOptions;
    use crate::schema::FieldType;
    use crate::testing::Fixture;
    use serde_json::json;

    fn fixture(index: Option<usize>) -> Fixture {
        let options = TranslationOptions {
            array_index: index,
            ..TranslationOptions::default()
        };
        Fixture::new(json!({}), "items", FieldSpec::new(FieldType::String), options)
    }

    #[tokio::test]
    async fn test_selects_element() {
        let result = fixture(Some(1)).run(&ArrayIndex::new(), Some(json!(["a", "b", "c"]))).await;
        assert_eq!(result, Some(Some(json!("b"))));

        let first = fixture(Some(0)).run(&ArrayIndex::new(), Some(json!(["a", "b"]))).await;
        assert_eq!(first, Some(Some(json!("a"))));
    }

    #[tokio::test]
    async fn test_out_of_range_is_no_value() {
        let result = fixture(Some(5)).run(&ArrayIndex::new(), Some(json!(["a"]))).await;
        assert_eq!(result, Some(None));

        let null = fixture(Some(0)).run(&ArrayIndex::new(), Some(json!([null]))).await;
        assert_eq!(null, Some(None));
    }

    #[tokio::test]
    async fn test_skips_without_index_or_array() {
        assert_eq!(fixture(None).run(&ArrayIndex::new(), Some(json!(["a"]))).await, None);
        assert_eq!(fixture(Some(0)).run(&ArrayIndex::new(), Some(json!("a"))).await, None);
    }
}
