//! Per-field translation options and their precedence merge
//!
//! Options reach a field from three levels: the call, the target schema, and
//! the field itself. They are combined with [`TranslationOptions::merge`],
//! applied left to right, where later levels win.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reference to providers from a pipeline, start, or end list
///
/// In configuration documents a collection is written with a leading `#`
/// (`"#String"`); that convention stops at the serde boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderRef {
    /// A single provider by name
    Named(String),
    /// Every provider whose collection tag matches
    Collection(String),
}

impl ProviderRef {
    pub fn named(name: impl Into<String>) -> Self {
        ProviderRef::Named(name.into())
    }

    pub fn collection(tag: impl Into<String>) -> Self {
        ProviderRef::Collection(tag.into())
    }
}

impl From<String> for ProviderRef {
    fn from(raw: String) -> Self {
        match raw.strip_prefix('#') {
            Some(tag) => ProviderRef::Collection(tag.to_string()),
            None => ProviderRef::Named(raw),
        }
    }
}

impl From<&str> for ProviderRef {
    fn from(raw: &str) -> Self {
        ProviderRef::from(raw.to_string())
    }
}

impl From<ProviderRef> for String {
    fn from(reference: ProviderRef) -> Self {
        reference.to_string()
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRef::Named(name) => write!(f, "{}", name),
            ProviderRef::Collection(tag) => write!(f, "#{}", tag),
        }
    }
}

/// A field's own request for built-in coercion placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypecastMode {
    Off,
    Start,
    End,
    Both,
}

impl TypecastMode {
    pub fn at_start(self) -> bool {
        matches!(self, TypecastMode::Start | TypecastMode::Both)
    }

    pub fn at_end(self) -> bool {
        matches!(self, TypecastMode::End | TypecastMode::Both)
    }
}

impl fmt::Display for TypecastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypecastMode::Off => write!(f, "off"),
            TypecastMode::Start => write!(f, "start"),
            TypecastMode::End => write!(f, "end"),
            TypecastMode::Both => write!(f, "both"),
        }
    }
}

/// Merged configuration for one field's translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOptions {
    /// Explicit ordered provider list; overrides start/end segmentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Vec<ProviderRef>>,

    /// Providers moved to the front of the registry order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Vec<ProviderRef>>,

    /// Providers moved to the back of the registry order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Vec<ProviderRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typecast: Option<TypecastMode>,

    /// Substring replacements, applied in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<Map<String, Value>>,

    /// Substrings removed from string values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<Vec<String>>,

    /// Enum value lookup table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,

    /// Alternative source keys tried when the primary one is empty
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub coalesce: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_separator: Option<String>,

    /// Property name used when wrapping a value into an object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_property: Option<String>,

    /// Values for `$$` sentinel source keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject: Option<Map<String, Value>>,

    /// Parse format for date-like providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Provider-specific nested option blocks
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    }))
}

impl TranslationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine two option levels; values present in `over` win
    ///
    /// List and scalar options are replaced wholesale. Map options merge key
    /// by key, recursing into nested objects.
    pub fn merge(base: &TranslationOptions, over: &TranslationOptions) -> TranslationOptions {
        TranslationOptions {
            pipeline: over.pipeline.clone().or_else(|| base.pipeline.clone()),
            start: over.start.clone().or_else(|| base.start.clone()),
            end: over.end.clone().or_else(|| base.end.clone()),
            typecast: over.typecast.or(base.typecast),
            replace: merge_optional_maps(&base.replace, &over.replace),
            clean: over.clean.clone().or_else(|| base.clean.clone()),
            dictionary: merge_optional_maps(&base.dictionary, &over.dictionary),
            array_index: over.array_index.or(base.array_index),
            coalesce: over.coalesce.clone().or_else(|| base.coalesce.clone()),
            join_separator: over
                .join_separator
                .clone()
                .or_else(|| base.join_separator.clone()),
            value_property: over
                .value_property
                .clone()
                .or_else(|| base.value_property.clone()),
            inject: merge_optional_maps(&base.inject, &over.inject),
            format: over.format.clone().or_else(|| base.format.clone()),
            extra: merge_maps(&base.extra, &over.extra),
        }
    }

    /// Merge a sequence of levels, lowest precedence first
    pub fn merge_all<'a, I>(levels: I) -> TranslationOptions
    where
        I: IntoIterator<Item = &'a TranslationOptions>,
    {
        levels
            .into_iter()
            .fold(TranslationOptions::default(), |acc, level| {
                TranslationOptions::merge(&acc, level)
            })
    }

    /// Deserialize a provider-specific block such as `link` or `currency`
    pub fn block<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.extra.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::Configuration {
                    message: format!("Invalid '{}' options: {}", name, e),
                    source: Some(e.into()),
                }),
        }
    }

    /// Raw access to a provider-specific block
    pub fn raw_block(&self, name: &str) -> Option<&Value> {
        self.extra.get(name).filter(|v| !v.is_null())
    }

    pub fn with_pipeline<I, R>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ProviderRef>,
    {
        self.pipeline = Some(refs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_start<I, R>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ProviderRef>,
    {
        self.start = Some(refs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_end<I, R>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ProviderRef>,
    {
        self.end = Some(refs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_typecast(mut self, mode: TypecastMode) -> Self {
        self.typecast = Some(mode);
        self
    }

    pub fn with_join_separator(mut self, separator: impl Into<String>) -> Self {
        self.join_separator = Some(separator.into());
        self
    }
}

fn merge_optional_maps(
    base: &Option<Map<String, Value>>,
    over: &Option<Map<String, Value>>,
) -> Option<Map<String, Value>> {
    match (base, over) {
        (Some(b), Some(o)) => Some(merge_maps(b, o)),
        (None, Some(o)) => Some(o.clone()),
        (Some(b), None) => Some(b.clone()),
        (None, None) => None,
    }
}

fn merge_maps(base: &Map<String, Value>, over: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in over {
        match merged.get_mut(key) {
            Some(existing) => merge_json(existing, value),
            None => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Deep-merge `over` into `base`; objects merge by key, anything else replaces
pub fn merge_json(base: &mut Value, over: &Value) {
    match (base, over) {
        (Value::Object(base_map), Value::Object(over_map)) => {
            for (key, value) in over_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, over) => *base = over.clone(),
    }
}
