//! Injection providers
//!
//! These fill a field from somewhere other than its own source path: the
//! whole source object, a caller-supplied `inject` map, alternative source
//! keys, or the field's declared default. All of them ask for coercion after
//! they run, since what they inject may have any type.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use super::INJECT_COLLECTION;
use crate::context::ExecutionContext;
use crate::path::{KeyPath, SourceRef};
use crate::provider::{is_truthy, Provider, ProviderDescriptor, TypecastPlacement};
use crate::schema::FieldSpec;
use async_trait::async_trait;
use serde_json::Value;

fn inject_descriptor(name: &str) -> ProviderDescriptor {
    ProviderDescriptor::new(name)
        .in_collection(INJECT_COLLECTION)
        .with_typecast(TypecastPlacement::End)
}

/// `$$ROOT` yields the entire source object
#[derive(Debug, Clone)]
pub struct InjectRoot {
    descriptor: ProviderDescriptor,
}

impl InjectRoot {
    pub fn new() -> Self {
        Self {
            descriptor: inject_descriptor("InjectRoot"),
        }
    }
}

impl Default for InjectRoot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for InjectRoot {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, _value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        matches!(ctx.source, SourceRef::Root)
    }

    async fn get_value(
        &self,
        _value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        Ok(Some(ctx.source_object.clone()))
    }
}

/// Other `$$` keys are looked up in the field's `inject` map
#[derive(Debug, Clone)]
pub struct InjectGlobal {
    descriptor: ProviderDescriptor,
}

impl InjectGlobal {
    pub fn new() -> Self {
        Self {
            descriptor: inject_descriptor("InjectGlobal"),
        }
    }

    fn injected<'a>(ctx: &ExecutionContext<'a>) -> Option<&'a Value> {
        let SourceRef::Global(key) = ctx.source else {
            return None;
        };
        ctx.options
            .inject
            .as_ref()?
            .get(key.as_str())
            .filter(|v| !v.is_null())
    }
}

impl Default for InjectGlobal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for InjectGlobal {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, _value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        Self::injected(ctx).is_some()
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        Ok(Self::injected(ctx).cloned().or(value))
    }
}

/// Falls back to alternative source keys when the primary one is empty
///
/// The first truthy alternative wins; if none is truthy the current value is
/// kept.
#[derive(Debug, Clone)]
pub struct InjectCoalesce {
    descriptor: ProviderDescriptor,
}

impl InjectCoalesce {
    pub fn new() -> Self {
        Self {
            descriptor: inject_descriptor("InjectCoalesce"),
        }
    }
}

impl Default for InjectCoalesce {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for InjectCoalesce {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, _value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        let has_alternatives = ctx.options.coalesce.as_ref().is_some_and(|keys| !keys.is_empty());
        let primary_empty = match ctx.source_value {
            None => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        has_alternatives && primary_empty
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let alternatives = ctx.options.coalesce.as_deref().unwrap_or_default();
        let found = alternatives
            .iter()
            .filter_map(|key| KeyPath::parse(key).resolve(ctx.source_object))
            .find(|candidate| is_truthy(Some(candidate)));

        Ok(found.cloned().or(value))
    }
}

/// Supplies the field's declared `default` when there is no value
#[derive(Debug, Clone)]
pub struct InjectDefault {
    descriptor: ProviderDescriptor,
}

impl InjectDefault {
    pub fn new() -> Self {
        Self {
            descriptor: inject_descriptor("InjectDefault"),
        }
    }
}

impl Default for InjectDefault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for InjectDefault {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        value.is_none() && ctx.field.default.is_some()
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        field: &FieldSpec,
        _ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        Ok(value.or_else(|| field.default.clone()))
    }
}
