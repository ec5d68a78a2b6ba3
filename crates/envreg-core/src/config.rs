//! Registry configuration
//!
//! Loaded from TOML; every key is optional and falls back to its default.

use crate::error::ConfigError;
use crate::store::DirectoryStore;
use crate::validation::{SchemaValidator, ValidatorOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding the records
    pub root: PathBuf,
    /// Record file extension (without dot)
    pub extension: String,
    /// `account-type` written into new records
    pub default_account_type: String,
    /// Environment created together with a new record
    pub creation_environment: String,
    /// Level of the initial grant in a new record
    pub creation_access_level: String,
    /// Reject records with repeated environment names
    pub strict_environment_names: bool,
}

impl RegistryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Invalid` if it is not valid TOML for this schema
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// With record directory
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// With strict environment-name checking
    #[inline]
    #[must_use]
    pub fn with_strict_environment_names(mut self, strict: bool) -> Self {
        self.strict_environment_names = strict;
        self
    }

    /// Validator configured from these settings
    #[inline]
    #[must_use]
    pub fn validator(&self) -> SchemaValidator {
        SchemaValidator::with_options(ValidatorOptions {
            unique_environment_names: self.strict_environment_names,
        })
    }

    /// Directory store for the configured root
    #[inline]
    #[must_use]
    pub fn directory_store(&self) -> DirectoryStore {
        DirectoryStore::with_extension(&self.root, &self.extension)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("environments"),
            extension: "json".to_string(),
            default_account_type: "member".to_string(),
            creation_environment: "development".to_string(),
            creation_access_level: "developer".to_string(),
            strict_environment_names: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = RegistryConfig::new();
        assert_eq!(config.root, PathBuf::from("environments"));
        assert_eq!(config.default_account_type, "member");
        assert_eq!(config.creation_access_level, "developer");
        assert!(!config.validator().options().unique_environment_names);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: RegistryConfig =
            toml::from_str("root = \"records\"\nstrict_environment_names = true\n").unwrap();
        assert_eq!(config.root, PathBuf::from("records"));
        assert_eq!(config.extension, "json");
        assert!(config.validator().options().unique_environment_names);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "creation_access_level = \"sandbox\"").unwrap();
        let config = RegistryConfig::load(file.path()).unwrap();
        assert_eq!(config.creation_access_level, "sandbox");
    }

    #[test]
    fn load_rejects_bad_types() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strict_environment_names = \"yes\"").unwrap();
        let err = RegistryConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn load_missing_file() {
        let err = RegistryConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder_overrides() {
        let config = RegistryConfig::new()
            .with_root("/tmp/records")
            .with_strict_environment_names(true);
        assert_eq!(config.directory_store().root(), Path::new("/tmp/records"));
        assert!(config.strict_environment_names);
    }
}
