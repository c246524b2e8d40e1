//! Target schema model
//!
//! A target schema is a JSON-Schema-like document whose properties carry
//! translation directives. Only the parts the engine reads are typed; every
//! other keyword is kept verbatim so schemas round-trip unchanged.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::options::TranslationOptions;
use crate::path::SourceRef;
use crate::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Declared type of a target field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    #[serde(alias = "integer")]
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn field_type<'de, D>(deserializer: D) -> std::result::Result<Option<FieldType>, D::Error>
where
    D: Deserializer<'de>,
{
    // JSON Schema allows `"type": ["string", "null"]`; the first non-null entry wins
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TypeDecl {
        One(String),
        Many(Vec<String>),
    }

    let names = match Option::<TypeDecl>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(TypeDecl::One(name)) => vec![name],
        Some(TypeDecl::Many(names)) => names,
    };

    match names.into_iter().find(|name| name != "null") {
        None => Ok(None),
        Some(name) => serde_json::from_value(Value::String(name.clone()))
            .map(Some)
            .map_err(|_| de::Error::custom(format!("unsupported field type '{}'", name))),
    }
}

/// First-generation directive naming exactly one provider for a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub provider: String,

    /// Remaining keys, handed to the provider through the context
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// The `translation` block of a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTranslation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<Conversion>,

    /// Field-level options, the highest precedence level
    #[serde(flatten)]
    pub options: TranslationOptions,
}

/// One declared property of a target schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<FieldType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<FieldTranslation>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// A field with no declared type
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn from(mut self, source: impl Into<String>) -> Self {
        self.from = Some(source.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn options(mut self, options: TranslationOptions) -> Self {
        self.translation.get_or_insert_with(FieldTranslation::default).options = options;
        self
    }

    pub fn conversion(mut self, provider: impl Into<String>, settings: Map<String, Value>) -> Self {
        self.translation.get_or_insert_with(FieldTranslation::default).conversion = Some(Conversion {
            provider: provider.into(),
            settings,
        });
        self
    }

    /// Source key, preferring the top-level `from` over `translation.from`
    pub fn source_key(&self) -> Option<&str> {
        self.from
            .as_deref()
            .or_else(|| self.translation.as_ref().and_then(|t| t.from.as_deref()))
    }

    pub fn source_ref(&self) -> Option<SourceRef> {
        self.source_key().map(SourceRef::parse)
    }

    /// Whether the field carries a translation directive at all
    pub fn is_translatable(&self) -> bool {
        self.source_key().is_some()
    }

    pub fn field_options(&self) -> Option<&TranslationOptions> {
        self.translation.as_ref().map(|t| &t.options)
    }

    pub fn conversion_directive(&self) -> Option<&Conversion> {
        self.translation.as_ref().and_then(|t| t.conversion.as_ref())
    }
}

/// Declared properties in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, FieldSpec)>);

impl Properties {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, spec)| spec)
    }

    /// Insert or replace a property, keeping the original position on replace
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.0.push((name, spec)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to field schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Properties, A::Error> {
                let mut properties = Properties::default();
                while let Some((name, spec)) = access.next_entry::<String, FieldSpec>()? {
                    properties.insert(name, spec);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// A schema describing the shape of translated objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    /// Identifier used for cross-schema references
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub properties: Properties,

    /// Schema-level defaults merged into every field's options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOptions>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TargetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.properties.insert(name, spec);
        self
    }

    pub fn with_translation(mut self, options: TranslationOptions) -> Self {
        self.translation = Some(options);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.properties.iter()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.properties.get(name)
    }

    pub fn schema_options(&self) -> Option<&TranslationOptions> {
        self.translation.as_ref()
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::Schema {
            message: format!("Invalid target schema: {}", e),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Schema {
            message: format!("Invalid target schema: {}", e),
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Schema {
            message: format!("Invalid target schema: {}", e),
        })
    }

    /// Load a schema document, choosing the parser from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("Failed to read schema from {:?}", path),
            source: e,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}

/// Find a schema by its `$id`
pub fn find_schema<'a>(schemas: &'a [TargetSchema], id: &str) -> Option<&'a TargetSchema> {
    schemas.iter().find(|schema| schema.id.as_deref() == Some(id))
}
