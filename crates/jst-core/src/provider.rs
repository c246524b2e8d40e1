//! Provider contract
//!
//! A provider is one pluggable transformation step. The engine asks it whether
//! it applies to a field ([`Provider::should_run`]) and, if so, feeds it the
//! current value ([`Provider::get_value`]). Providers may suspend for I/O; the
//! executor awaits each one before starting the next.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::context::ExecutionContext;
use crate::schema::FieldSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Coercion placement a provider requires for the fields it runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypecastPlacement {
    /// Coerce before the provider list runs
    Start,
    /// Coerce after the provider list runs
    End,
    /// Never coerce this field
    Off,
}

impl fmt::Display for TypecastPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypecastPlacement::Start => write!(f, "start"),
            TypecastPlacement::End => write!(f, "end"),
            TypecastPlacement::Off => write!(f, "off"),
        }
    }
}

/// Registration metadata of a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Unique name within a registry
    pub name: String,
    /// Grouping label selectable with a `#Collection` reference
    pub collection: Option<String>,
    /// Coercion placement requirement; `None` means no opinion
    pub typecast: Option<TypecastPlacement>,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            typecast: None,
        }
    }

    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_typecast(mut self, placement: TypecastPlacement) -> Self {
        self.typecast = Some(placement);
        self
    }

    pub fn belongs_to(&self, collection: &str) -> bool {
        self.collection.as_deref() == Some(collection)
    }
}

/// A transformation step that can take part in a field's pipeline
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name, collection, and typecast requirement
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Whether this provider applies to the field
    ///
    /// Must be free of side effects: the engine calls it speculatively while
    /// planning to detect typecast conflicts.
    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool;

    /// Produce the next value from the current one
    async fn get_value(
        &self,
        value: Option<Value>,
        field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn collection(&self) -> Option<&str> {
        self.descriptor().collection.as_deref()
    }

    fn typecast(&self) -> Option<TypecastPlacement> {
        self.descriptor().typecast
    }
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("collection", &self.collection())
            .field("typecast", &self.typecast())
            .finish()
    }
}

/// JavaScript-style truthiness used by provider predicates
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
