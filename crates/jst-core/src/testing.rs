//! Test doubles shared by unit tests
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::context::ExecutionContext;
use crate::options::TranslationOptions;
use crate::path::SourceRef;
use crate::provider::{Provider, ProviderDescriptor, TypecastPlacement};
use crate::registry::ProviderRegistry;
use crate::schema::{FieldSpec, TargetSchema};
use async_trait::async_trait;
use serde_json::Value;

/// Provider with fixed metadata and predictable behavior
///
/// Without a configured output it appends its own name to string values, so
/// the execution order shows up in the result.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    descriptor: ProviderDescriptor,
    runs: bool,
    output: Option<Value>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, collection: Option<&str>) -> Self {
        let mut descriptor = ProviderDescriptor::new(name);
        if let Some(collection) = collection {
            descriptor = descriptor.in_collection(collection);
        }
        Self {
            descriptor,
            runs: true,
            output: None,
        }
    }

    pub fn typecast(mut self, placement: TypecastPlacement) -> Self {
        self.descriptor = self.descriptor.with_typecast(placement);
        self
    }

    pub fn runs(mut self, runs: bool) -> Self {
        self.runs = runs;
        self
    }

    pub fn returns(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, _value: Option<&Value>, _ctx: &ExecutionContext<'_>) -> bool {
        self.runs
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        _ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        if let Some(output) = &self.output {
            return Ok(Some(output.clone()));
        }
        Ok(match value {
            Some(Value::String(s)) => Some(Value::String(format!("{}{}", s, self.descriptor.name))),
            other => other,
        })
    }
}

/// Owned pieces of an [`ExecutionContext`] for driving a provider directly
pub struct Fixture {
    pub source: Value,
    pub source_ref: SourceRef,
    pub field: FieldSpec,
    pub schema: TargetSchema,
    pub registry: ProviderRegistry,
    pub options: TranslationOptions,
    pub method_options: TranslationOptions,
}

impl Fixture {
    /// A field reading `from` out of `source`, with the given merged options
    pub fn new(source: Value, from: &str, field: FieldSpec, options: TranslationOptions) -> Self {
        Self {
            source,
            source_ref: SourceRef::parse(from),
            field: field.from(from),
            schema: TargetSchema::new(),
            registry: ProviderRegistry::with_defaults(),
            options,
            method_options: TranslationOptions::default(),
        }
    }

    pub fn ctx(&self) -> ExecutionContext<'_> {
        ExecutionContext {
            target_key: "field",
            source: &self.source_ref,
            source_object: &self.source,
            source_value: self.source_ref.resolve(&self.source),
            target_schema: &self.schema,
            field: &self.field,
            schemas: &[],
            registry: &self.registry,
            options: &self.options,
            method_options: &self.method_options,
            conversion: None,
        }
    }

    /// Run `provider` on `value`; `None` when its predicate does not hold
    pub async fn run(&self, provider: &dyn Provider, value: Option<Value>) -> Option<Option<Value>> {
        let ctx = self.ctx();
        if !provider.should_run(value.as_ref(), &ctx) {
            return None;
        }
        Some(provider
            .get_value(value, &self.field, &ctx)
            .await
            .expect("provider step succeeds"))
    }
}
