//! Translator configuration
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (JSON, YAML, or TOML)
//! - Environment variables
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::options::{TranslationOptions, TypecastMode};
use crate::schema::TargetSchema;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default typecast mode
pub const ENV_TYPECAST: &str = "JST_TYPECAST";
/// Environment variable overriding the default join separator
pub const ENV_JOIN_SEPARATOR: &str = "JST_JOIN_SEPARATOR";
/// Environment variable overriding the default wrap property
pub const ENV_VALUE_PROPERTY: &str = "JST_VALUE_PROPERTY";
/// Environment variable pointing at a directory of known schemas
pub const ENV_SCHEMAS_DIR: &str = "JST_SCHEMAS_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Call-level options applied to every translation
    pub defaults: TranslationOptions,

    /// Directory of schema documents available for cross-schema references
    pub schemas_dir: Option<PathBuf>,
}

impl TranslatorConfig {
    /// Load configuration from a file, choosing the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("Failed to read configuration from {:?}", path),
            source: e,
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            other => {
                return Err(Error::configuration(format!(
                    "Unsupported configuration format {:?} for {:?}",
                    other, path
                )))
            }
        };

        Ok(config)
    }

    /// Load a file and then apply environment overrides
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Self::load(path)?.apply_env()
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TYPECAST) {
            let mode: TypecastMode = serde_json::from_value(Value::String(raw.to_lowercase()))
                .map_err(|e| Error::Configuration {
                    message: format!("Invalid {} value '{}'", ENV_TYPECAST, raw),
                    source: Some(e.into()),
                })?;
            self.defaults.typecast = Some(mode);
        }
        if let Some(separator) = lookup(ENV_JOIN_SEPARATOR) {
            self.defaults.join_separator = Some(separator);
        }
        if let Some(property) = lookup(ENV_VALUE_PROPERTY) {
            self.defaults.value_property = Some(property);
        }
        if let Some(dir) = lookup(ENV_SCHEMAS_DIR) {
            self.schemas_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    /// Load every schema document in `schemas_dir`, ordered by file name
    pub fn load_schemas(&self) -> Result<Vec<TargetSchema>> {
        match &self.schemas_dir {
            Some(dir) => load_schema_dir(dir),
            None => Ok(Vec::new()),
        }
    }
}

/// Load `*.json`, `*.yaml`, and `*.yml` schema documents from a directory
pub fn load_schema_dir(dir: &Path) -> Result<Vec<TargetSchema>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::Io {
        message: format!("Failed to read schema directory {:?}", dir),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_schema = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("json") | Some("yaml") | Some("yml")
        );
        if path.is_file() && is_schema {
            paths.push(path);
        }
    }
    paths.sort();

    paths.iter().map(|path| TargetSchema::load(path)).collect()
}
