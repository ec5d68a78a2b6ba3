//! Registry service
//!
//! Ties the validator, detector and merger to a [`DocumentStore`]. Every
//! operation reads whole documents and writes whole documents; nothing here
//! locks, so concurrent writers must be serialized by the caller.

use crate::config::RegistryConfig;
use crate::create::{check_application_name, NewApplication};
use crate::detector::{self, Registration};
use crate::error::{RegistryError, RegistryResult};
use crate::merge::{merge_access_document, MergeOutcome};
use crate::model::{AccessGrant, EnvironmentRecord};
use crate::store::DocumentStore;
use crate::validation::SchemaValidator;
use serde_json::Value;
use std::path::Path;

/// Environment records backed by a document store
#[derive(Debug, Clone)]
pub struct Registry<S> {
    store: S,
    config: RegistryConfig,
    validator: SchemaValidator,
}

impl<S: DocumentStore> Registry<S> {
    /// Create registry over `store`
    #[must_use]
    pub fn new(store: S, config: RegistryConfig) -> Self {
        let validator = config.validator();
        Self {
            store,
            config,
            validator,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Consume registry, returning the store
    #[inline]
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Check whether `app_name` is registered by key or by `tags.application`
    ///
    /// # Errors
    /// - `RegistryError::InvalidRecord` if the name cannot be a record key
    /// - store I/O failures
    pub fn application_exists(&self, app_name: &str) -> RegistryResult<bool> {
        check_key(app_name)?;
        detector::exists(app_name, &self.store)
    }

    /// Register a new application
    ///
    /// # Errors
    /// - `RegistryError::InvalidRecord` if the name cannot be a record key
    /// - `RegistryError::DuplicateApplication` if already registered
    /// - store I/O failures
    pub fn create_application(&mut self, app: NewApplication) -> RegistryResult<EnvironmentRecord> {
        let name = app.name.clone();
        check_key(&name)?;

        if let Some(registration) = detector::find_registration(&name, &self.store)? {
            tracing::warn!(application = %name, existing = registration.key(), "application already registered");
            return Err(duplicate(&name, registration));
        }

        let record = app.into_record(&self.config);
        let document = record.to_value();
        self.validator
            .validate(&document)
            .map_err(|source| RegistryError::invalid_record(&name, source))?;
        self.store.put(&name, &document)?;

        tracing::info!(application = %name, "application created");
        Ok(record)
    }

    /// Merge grants into one environment of an existing record
    ///
    /// The stored record is validated before merging and the merged record
    /// before writing. The merge is applied to the stored document itself,
    /// so key order, `null` values and unknown keys survive. Nothing is
    /// written when every proposed grant was already present.
    ///
    /// # Errors
    /// - `RegistryError::InvalidRecord` if the name cannot be a record key,
    ///   the stored record fails validation, or a proposed grant would make
    ///   it invalid
    /// - `RegistryError::NotFound` if no record is filed under `app_name`
    /// - `RegistryError::Parse` for unreadable records
    /// - store I/O failures
    pub fn amend_access(
        &mut self,
        app_name: &str,
        environment: &str,
        grants: &[AccessGrant],
    ) -> RegistryResult<MergeOutcome> {
        let mut document = self.load_validated(app_name)?;
        let outcome = merge_access_document(&mut document, environment, grants)
            .map_err(|source| RegistryError::invalid_record(app_name, source))?;

        if outcome.is_noop() {
            tracing::info!(application = app_name, environment, "access already up to date");
            return Ok(outcome);
        }

        if let Err(source) = self.validator.validate(&document) {
            tracing::warn!(application = app_name, environment, error = %source, "merged record rejected");
            return Err(RegistryError::invalid_record(app_name, source));
        }
        self.store.put(app_name, &document)?;
        tracing::info!(
            application = app_name,
            environment,
            added = outcome.added,
            skipped = outcome.skipped,
            created = outcome.environment_created,
            "access updated"
        );
        Ok(outcome)
    }

    /// Load, validate and type the record filed under `app_name`
    ///
    /// # Errors
    /// As for [`Registry::validate_application`], plus
    /// `RegistryError::Model` if a field outside the schema has an
    /// unexpected type.
    pub fn load_record(&self, app_name: &str) -> RegistryResult<EnvironmentRecord> {
        let document = self.load_validated(app_name)?;
        EnvironmentRecord::from_value(app_name, document)
    }

    /// Validate the record filed under `app_name`
    ///
    /// # Errors
    /// - `RegistryError::InvalidRecord` if the name cannot be a record key
    /// - `RegistryError::NotFound` if no record is filed under `app_name`
    /// - `RegistryError::Parse` if it is not JSON
    /// - `RegistryError::InvalidRecord` on the first schema violation
    pub fn validate_application(&self, app_name: &str) -> RegistryResult<()> {
        self.load_validated(app_name).map(drop)
    }

    /// Validate any record file on disk, inside the store or not
    ///
    /// # Errors
    /// - `RegistryError::Io` if the file cannot be read
    /// - `RegistryError::Parse` if it is not JSON
    /// - `RegistryError::InvalidRecord` on the first schema violation
    pub fn validate_file(&self, path: impl AsRef<Path>) -> RegistryResult<()> {
        validate_file_with(&self.validator, path)
    }

    fn load_validated(&self, app_name: &str) -> RegistryResult<Value> {
        check_key(app_name)?;
        let document = self
            .store
            .get(app_name)?
            .ok_or_else(|| RegistryError::NotFound {
                record: app_name.to_string(),
            })?;
        self.validator
            .validate(&document)
            .map_err(|source| RegistryError::invalid_record(app_name, source))?;
        Ok(document)
    }
}

/// Validate a record file with the given validator
///
/// # Errors
/// See [`Registry::validate_file`].
pub fn validate_file_with(
    validator: &SchemaValidator,
    path: impl AsRef<Path>,
) -> RegistryResult<()> {
    let path = path.as_ref();
    let record = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| RegistryError::io_error(path, e))?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
        record: record.clone(),
        source,
    })?;
    validator
        .validate(&document)
        .map_err(|source| RegistryError::invalid_record(record, source))
}

/// Refuse names that cannot be used as a store key
fn check_key(app_name: &str) -> RegistryResult<()> {
    check_application_name(app_name).map_err(|source| RegistryError::invalid_record(app_name, source))
}

fn duplicate(application: &str, registration: Registration) -> RegistryError {
    RegistryError::DuplicateApplication {
        application: application.to_string(),
        existing: registration.key().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::store::MemoryStore;

    fn app(name: &str) -> NewApplication {
        NewApplication {
            name: name.to_string(),
            business_unit: "Platforms".to_string(),
            sso_group: "modernisation-platform".to_string(),
            ..NewApplication::default()
        }
    }

    fn registry() -> Registry<MemoryStore> {
        Registry::new(MemoryStore::new(), RegistryConfig::new())
    }

    #[test]
    fn create_then_exists() {
        let mut registry = registry();
        registry.create_application(app("orders")).unwrap();
        assert!(registry.application_exists("orders").unwrap());
        assert!(registry.application_exists("ORDERS").unwrap());
        assert!(registry.store().raw("orders").unwrap().ends_with("}\n"));
    }

    #[test]
    fn create_refuses_duplicate_key() {
        let mut registry = registry();
        registry.create_application(app("orders")).unwrap();
        let err = registry.create_application(app("orders")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateApplication { .. }));
    }

    #[test]
    fn create_refuses_duplicate_tag() {
        let mut store = MemoryStore::new();
        store.insert_raw(
            "legacy",
            r#"{"environments": [], "tags": {"application": "Orders"}}"#,
        );
        let mut registry = Registry::new(store, RegistryConfig::new());

        let err = registry.create_application(app("orders")).unwrap_err();
        match err {
            RegistryError::DuplicateApplication { existing, .. } => assert_eq!(existing, "legacy"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.store().len(), 1);
    }

    #[test]
    fn create_rejects_unusable_name() {
        let err = registry().create_application(app("../orders")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidRecord {
                source: ValidationError::InvalidValue { .. },
                ..
            }
        ));
    }

    #[test]
    fn amend_missing_record() {
        let err = registry()
            .amend_access("ghost", "development", &[AccessGrant::new("a", "b")])
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { ref record } if record == "ghost"));
    }

    #[test]
    fn amend_refuses_invalid_record() {
        let mut store = MemoryStore::new();
        store.insert_raw("orders", r#"{"environments": [{"name": ""}]}"#);
        let mut registry = Registry::new(store, RegistryConfig::new());

        let err = registry
            .amend_access("orders", "development", &[AccessGrant::new("a", "b")])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("orders"));
        assert!(message.contains("environments[0].name"));
        assert_eq!(
            registry.store().raw("orders"),
            Some(r#"{"environments": [{"name": ""}]}"#)
        );
    }

    #[test]
    fn every_keyed_operation_rejects_unusable_name() {
        let mut store = MemoryStore::new();
        store.insert_raw("../orders", r#"{"environments": []}"#);
        let mut registry = Registry::new(store, RegistryConfig::new());
        let grants = [AccessGrant::new("a", "b")];

        let is_key_error = |err: RegistryError| {
            matches!(
                err,
                RegistryError::InvalidRecord {
                    source: ValidationError::InvalidValue { .. },
                    ..
                }
            )
        };
        assert!(is_key_error(registry.amend_access("../orders", "dev", &grants).unwrap_err()));
        assert!(is_key_error(registry.load_record("../orders").unwrap_err()));
        assert!(is_key_error(registry.validate_application("../orders").unwrap_err()));
        assert!(is_key_error(registry.application_exists("../orders").unwrap_err()));
        assert_eq!(registry.store().raw("../orders"), Some(r#"{"environments": []}"#));
    }

    #[test]
    fn amend_rejects_blank_grant_without_writing() {
        let mut store = MemoryStore::new();
        let raw = r#"{"environments": [{"name": "dev", "access": [{"sso_group_name": "a", "level": "b"}]}]}"#;
        store.insert_raw("orders", raw);
        let mut registry = Registry::new(store, RegistryConfig::new());

        let err = registry
            .amend_access("orders", "dev", &[AccessGrant::new("", "")])
            .unwrap_err();
        assert!(err.to_string().contains("environments[0].access[1].sso_group_name"));
        assert_eq!(registry.store().raw("orders"), Some(raw));
    }

    #[test]
    fn amend_keeps_null_keys_and_order() {
        let mut store = MemoryStore::new();
        store.insert_raw(
            "orders",
            r#"{"codeowners": ["@org/a"], "go-live-date": null, "environments": [{"nuke": "excluded", "name": "dev"}]}"#,
        );
        let mut registry = Registry::new(store, RegistryConfig::new());
        registry
            .amend_access("orders", "dev", &[AccessGrant::new("a", "b")])
            .unwrap();

        let expected = r#"{
  "codeowners": [
    "@org/a"
  ],
  "go-live-date": null,
  "environments": [
    {
      "nuke": "excluded",
      "name": "dev",
      "access": [
        {
          "sso_group_name": "a",
          "level": "b"
        }
      ]
    }
  ]
}
"#;
        assert_eq!(registry.store().raw("orders"), Some(expected));
    }

    #[test]
    fn noop_amend_does_not_rewrite() {
        let mut store = MemoryStore::new();
        let raw = r#"{"environments": [{"name": "dev", "access": [{"sso_group_name": "a", "level": "b"}]}]}"#;
        store.insert_raw("orders", raw);
        let mut registry = Registry::new(store, RegistryConfig::new());

        let outcome = registry
            .amend_access("orders", "dev", &[AccessGrant::new("a", "b")])
            .unwrap();
        assert!(outcome.is_noop());
        assert_eq!(registry.store().raw("orders"), Some(raw));
    }

    #[test]
    fn strict_config_rejects_repeated_environment() {
        let mut store = MemoryStore::new();
        store.insert_raw("orders", r#"{"environments": [{"name": "dev"}, {"name": "dev"}]}"#);
        let lenient = Registry::new(store.clone(), RegistryConfig::new());
        let strict = Registry::new(
            store,
            RegistryConfig::new().with_strict_environment_names(true),
        );

        assert!(lenient.validate_application("orders").is_ok());
        assert!(strict.validate_application("orders").is_err());
    }

    #[test]
    fn validate_missing_application() {
        let err = registry().validate_application("ghost").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }
}
