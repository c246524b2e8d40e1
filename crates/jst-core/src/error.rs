//! Error types for the JST core library
//!
//! This module defines the error handling system for the translation engine,
//! using thiserror for the error definitions and anyhow to carry collaborator
//! failures without constraining their concrete error types.

use thiserror::Error;

/// Main error type for JST operations
#[derive(Error, Debug)]
pub enum Error {
    /// Providers selected for a field disagree on where coercion runs
    #[error("Typecast conflict on field '{field}': {message}")]
    TypecastConflict { field: String, message: String },

    /// A field's conversion directive names a provider that is not registered
    #[error("Required provider '{provider}' is not registered (field '{field}')")]
    ProviderNotRegistered { field: String, provider: String },

    /// Coercion to the target type has no defined rule for the value's type
    #[error("Cannot cast type {from} to {to} (field '{field}')")]
    Coercion {
        field: String,
        from: String,
        to: String,
    },

    /// A provider's value step failed
    #[error("Provider error: {provider} on field '{field}' - {source}")]
    Provider {
        provider: String,
        field: String,
        #[source]
        source: anyhow::Error,
    },

    /// Target schema documents that cannot be used
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// TOML parsing errors
    #[error("TOML error: {message}")]
    Toml {
        message: String,
        #[source]
        source: toml::de::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error comes from a contradictory or incomplete field setup
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::TypecastConflict { .. }
                | Error::ProviderNotRegistered { .. }
                | Error::Configuration { .. }
        )
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Coercion {
            field: "price".to_string(),
            from: "array".to_string(),
            to: "number".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot cast type array to number (field 'price')");
    }

    #[test]
    fn test_configuration_classification() {
        let conflict = Error::TypecastConflict {
            field: "name".to_string(),
            message: "pipeline requires typecast at start and end together".to_string(),
        };
        assert!(conflict.is_configuration());

        let provider = Error::Provider {
            provider: "Lookup".to_string(),
            field: "owner".to_string(),
            source: anyhow::anyhow!("connection reset"),
        };
        assert!(!provider.is_configuration());
        assert!(provider.to_string().contains("connection reset"));
    }
}
