//! Error types for envreg
//!
//! - [`ValidationError`]: a document violates the record schema
//! - [`RegistryError`]: an operation against a record or the store failed
//! - [`ConfigError`]: the registry configuration could not be loaded

use crate::path::FieldPath;
use std::path::PathBuf;

/// Schema violations, reported fail-fast with the offending field path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field missing or of the wrong structural type
    #[error("'{path}' must be {expected}")]
    InvalidShape {
        path: FieldPath,
        expected: &'static str,
    },

    /// Field has the right type but fails a value constraint
    #[error("'{path}' {reason}")]
    InvalidValue { path: FieldPath, reason: String },
}

impl ValidationError {
    /// Create shape error for path
    pub fn invalid_shape(path: FieldPath, expected: &'static str) -> Self {
        Self::InvalidShape { path, expected }
    }

    /// Create value error for path
    pub fn invalid_value(path: FieldPath, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            path,
            reason: reason.into(),
        }
    }

    /// Path of the offending field
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::InvalidShape { path, .. } | Self::InvalidValue { path, .. } => path,
        }
    }
}

/// Errors raised by registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Record failed schema validation
    #[error("record '{record}' is invalid: {source}")]
    InvalidRecord {
        record: String,
        #[source]
        source: ValidationError,
    },

    /// Application already registered, by store key or by `tags.application`
    #[error("application '{application}' already exists (record '{existing}')")]
    DuplicateApplication {
        application: String,
        existing: String,
    },

    /// Record does not exist in the store
    #[error("record '{record}' does not exist")]
    NotFound { record: String },

    /// Underlying read or write failed
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record text is not valid JSON
    #[error("record '{record}' is not valid JSON: {source}")]
    Parse {
        record: String,
        #[source]
        source: serde_json::Error,
    },

    /// Record could not be rendered for writing
    #[error("record '{record}' could not be serialized: {source}")]
    Serialize {
        record: String,
        #[source]
        source: serde_json::Error,
    },

    /// Record passed validation but does not fit the typed model
    #[error("record '{record}' does not match the record model: {source}")]
    Model {
        record: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the record name to a validation error
    pub fn invalid_record(record: impl Into<String>, source: ValidationError) -> Self {
        Self::InvalidRecord {
            record: record.into(),
            source,
        }
    }
}

/// Errors while loading [`RegistryConfig`](crate::config::RegistryConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the config schema
    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_shape_display() {
        let err = ValidationError::invalid_shape(FieldPath::key("environments"), "a list");
        assert_eq!(err.to_string(), "'environments' must be a list");
    }

    #[test]
    fn invalid_value_display() {
        let err = ValidationError::invalid_value(
            FieldPath::key("environments").index(1).child("name"),
            "must be a non-empty string",
        );
        assert_eq!(
            err.to_string(),
            "'environments[1].name' must be a non-empty string"
        );
    }

    #[test]
    fn invalid_record_names_record_and_path() {
        let err = RegistryError::invalid_record(
            "orders",
            ValidationError::invalid_shape(FieldPath::key("tags"), "an object"),
        );
        let message = err.to_string();
        assert!(message.contains("orders"));
        assert!(message.contains("'tags' must be an object"));
    }

    #[test]
    fn duplicate_display() {
        let err = RegistryError::DuplicateApplication {
            application: "foo".to_string(),
            existing: "legacy-foo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "application 'foo' already exists (record 'legacy-foo')"
        );
    }
}
