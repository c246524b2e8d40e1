//! JST Core - Schema-driven JSON translation engine
//!
//! This crate translates an arbitrary source object into a target object whose
//! shape is declared by a schema annotated with per-field translation
//! directives. Each field names a source path and an ordered set of
//! transformation steps (providers); the engine resolves the source value,
//! runs it through the providers with built-in type coercion before and/or
//! after, and assembles the result.
//!
//! # Main Components
//!
//! - **Path Resolution**: Dotted/indexed key paths and `$$` sentinel sources
//! - **Provider Registry**: Ordered default providers plus caller extensions
//! - **Pipeline Planning**: Explicit pipelines, start/end segments, conversions
//! - **Typecast Coordination**: Coercion placement and conflict detection
//! - **Translation**: Per-field execution and whole-object assembly
//!
//! # Example
//!
//! ```no_run
//! use jst_core::{FieldSpec, FieldType, TargetSchema, Translator, Result};
//! use serde_json::json;
//!
//! async fn example() -> Result<()> {
//!     let schema = TargetSchema::new()
//!         .with_field("price", FieldSpec::new(FieldType::Number).from("price"));
//!
//!     let output = Translator::new()
//!         .translate_object(&json!({"price": "12.50"}), &schema)
//!         .await?;
//!     assert_eq!(output, json!({"price": 12.5}));
//!     Ok(())
//! }
//! ```

pub mod coerce;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod options;
pub mod path;
pub mod planner;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod schema;
pub mod translator;
pub mod typecast;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use config::TranslatorConfig;
pub use context::ExecutionContext;
pub use executor::translate_value;
pub use options::{ProviderRef, TranslationOptions, TypecastMode};
pub use path::{resolve, KeyPath, SourceRef};
pub use planner::{plan_pipeline, Pipeline};
pub use provider::{Provider, ProviderDescriptor, TypecastPlacement};
pub use registry::ProviderRegistry;
pub use schema::{Conversion, FieldSpec, FieldTranslation, FieldType, TargetSchema};
pub use translator::{translate_object, translate_object_with, Translator, TranslatorBuilder};
pub use typecast::TypecastPlan;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
