//! Per-field execution context handed to providers
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::options::TranslationOptions;
use crate::path::SourceRef;
use crate::registry::ProviderRegistry;
use crate::schema::{find_schema, Conversion, FieldSpec, TargetSchema};
use serde_json::Value;

/// Read-only view of everything a provider may consult for one field
///
/// A context is built once per field per translation call and dropped once
/// the field's value is produced. Providers must not rely on it outliving
/// their `get_value` call.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Name of the output property being produced
    pub target_key: &'a str,

    /// Where the starting value came from
    pub source: &'a SourceRef,

    /// The whole object being translated
    pub source_object: &'a Value,

    /// Value resolved from the source path before any provider ran
    pub source_value: Option<&'a Value>,

    /// Schema the field belongs to
    pub target_schema: &'a TargetSchema,

    /// Declaration of the field being produced
    pub field: &'a FieldSpec,

    /// Other known schemas, for collaborators that create related records
    pub schemas: &'a [TargetSchema],

    /// The full provider registry of this call
    pub registry: &'a ProviderRegistry,

    /// Merged call, schema, and field options
    pub options: &'a TranslationOptions,

    /// Call-level options, forwarded to nested translations
    pub method_options: &'a TranslationOptions,

    /// First-generation conversion directive, when the field declares one
    pub conversion: Option<&'a Conversion>,
}

impl<'a> ExecutionContext<'a> {
    /// The source key as written in the schema
    pub fn source_key(&self) -> &'a str {
        self.source.key()
    }

    /// Look up another known schema by `$id`
    pub fn schema(&self, id: &str) -> Option<&'a TargetSchema> {
        find_schema(self.schemas, id)
    }
}
