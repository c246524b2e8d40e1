//! Object translation
//!
//! This module holds the public entry points: the [`Translator`] built from a
//! registry, known schemas, and call-level options, and the free functions
//! collaborators use to run a nested translation with the context they were
//! given.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::config::TranslatorConfig;
use crate::context::ExecutionContext;
use crate::executor::translate_value;
use crate::options::TranslationOptions;
use crate::provider::Provider;
use crate::registry::ProviderRegistry;
use crate::schema::{FieldSpec, TargetSchema};
use crate::Result;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Translates source objects into the shape of target schemas
#[derive(Debug, Clone)]
pub struct Translator {
    registry: ProviderRegistry,
    schemas: Vec<TargetSchema>,
    options: TranslationOptions,
}

impl Translator {
    /// A translator with the default providers and no call-level options
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::with_defaults(),
            schemas: Vec::new(),
            options: TranslationOptions::default(),
        }
    }

    pub fn builder() -> TranslatorBuilder {
        TranslatorBuilder::new()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn schemas(&self) -> &[TargetSchema] {
        &self.schemas
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Produce an object with one property per translatable field of `schema`
    pub async fn translate_object(&self, source: &Value, schema: &TargetSchema) -> Result<Value> {
        translate_object_with(source, schema, &self.registry, &self.schemas, &self.options).await
    }

    /// Translate with a known schema looked up by `$id`
    pub async fn translate_object_as(&self, source: &Value, schema_id: &str) -> Result<Value> {
        let schema = crate::schema::find_schema(&self.schemas, schema_id).ok_or_else(|| {
            crate::Error::Schema {
                message: format!("Unknown schema '{}'", schema_id),
            }
        })?;
        self.translate_object(source, schema).await
    }

    /// Translate one named field; `None` if the field is absent or untranslatable
    pub async fn translate_field(
        &self,
        source: &Value,
        schema: &TargetSchema,
        name: &str,
    ) -> Result<Option<Value>> {
        match schema.field(name) {
            Some(spec) => {
                translate_field_with(source, schema, name, spec, &self.registry, &self.schemas, &self.options)
                    .await
            }
            None => Ok(None),
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate `source` with the default registry and the given call-level options
pub async fn translate_object(
    source: &Value,
    schema: &TargetSchema,
    options: &TranslationOptions,
) -> Result<Value> {
    translate_object_with(source, schema, &ProviderRegistry::with_defaults(), &[], options).await
}

/// Translate `source` with an explicit registry, schema list, and call options
///
/// Fields are produced in declaration order. Fields without a source
/// directive are skipped; fields whose value ends up absent are left out of
/// the output. The first error aborts the whole object.
pub async fn translate_object_with(
    source: &Value,
    schema: &TargetSchema,
    registry: &ProviderRegistry,
    schemas: &[TargetSchema],
    method_options: &TranslationOptions,
) -> Result<Value> {
    debug!(schema = schema.id.as_deref().unwrap_or("<anonymous>"), fields = schema.properties.len(), "translating object");

    let mut output = Map::new();
    for (name, spec) in schema.fields() {
        if !spec.is_translatable() {
            continue;
        }
        let value = translate_field_with(source, schema, name, spec, registry, schemas, method_options).await?;
        if let Some(value) = value {
            output.insert(name.to_string(), value);
        }
    }

    Ok(Value::Object(output))
}

async fn translate_field_with(
    source: &Value,
    schema: &TargetSchema,
    name: &str,
    spec: &FieldSpec,
    registry: &ProviderRegistry,
    schemas: &[TargetSchema],
    method_options: &TranslationOptions,
) -> Result<Option<Value>> {
    let Some(source_ref) = spec.source_ref() else {
        return Ok(None);
    };

    let defaults = TranslationOptions::default();
    let options = TranslationOptions::merge_all([
        method_options,
        schema.schema_options().unwrap_or(&defaults),
        spec.field_options().unwrap_or(&defaults),
    ]);
    let source_value = source_ref.resolve(source);

    let ctx = ExecutionContext {
        target_key: name,
        source: &source_ref,
        source_object: source,
        source_value,
        target_schema: schema,
        field: spec,
        schemas,
        registry,
        options: &options,
        method_options,
        conversion: spec.conversion_directive(),
    };

    translate_value(source_value.cloned(), &ctx).await
}

/// Fluent construction of a [`Translator`]
pub struct TranslatorBuilder {
    include_defaults: bool,
    providers: Vec<Arc<dyn Provider>>,
    schemas: Vec<TargetSchema>,
    options: TranslationOptions,
}

impl TranslatorBuilder {
    pub fn new() -> Self {
        Self {
            include_defaults: true,
            providers: Vec::new(),
            schemas: Vec::new(),
            options: TranslationOptions::default(),
        }
    }

    /// Start from a loaded configuration: its defaults and its schema directory
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self::new()
            .options(config.defaults.clone())
            .schemas(config.load_schemas()?))
    }

    /// Append a provider after the defaults and previously added providers
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Provider>>,
    {
        self.providers.extend(providers);
        self
    }

    /// Build a registry holding only the added providers
    pub fn without_defaults(mut self) -> Self {
        self.include_defaults = false;
        self
    }

    pub fn schema(mut self, schema: TargetSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn schemas<I>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = TargetSchema>,
    {
        self.schemas.extend(schemas);
        self
    }

    /// Call-level options, the lowest precedence level
    pub fn options(mut self, options: TranslationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Translator> {
        let registry = if self.include_defaults {
            ProviderRegistry::with_extra(self.providers)?
        } else {
            ProviderRegistry::build(Vec::new(), self.providers)?
        };

        Ok(Translator {
            registry,
            schemas: self.schemas,
            options: self.options,
        })
    }
}

impl Default for TranslatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
