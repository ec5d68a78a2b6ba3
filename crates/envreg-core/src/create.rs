//! New record construction

use crate::config::RegistryConfig;
use crate::error::ValidationError;
use crate::model::{AccessGrant, Environment, EnvironmentRecord, APPLICATION_TAG};
use crate::path::FieldPath;
use serde_json::{Map, Value};

/// Metadata for registering a new application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub business_unit: String,
    pub infrastructure_support: String,
    pub owner: String,
    pub slack_channel: String,
    pub critical_national_infrastructure: bool,
    /// Group granted access to the initial environment
    pub sso_group: String,
    /// May be empty
    pub go_live_date: String,
    pub codeowners: Option<Vec<String>>,
}

impl NewApplication {
    /// Build the initial record
    ///
    /// The record has one environment (`config.creation_environment`) granting
    /// `sso_group` the `config.creation_access_level` level.
    #[must_use]
    pub fn into_record(self, config: &RegistryConfig) -> EnvironmentRecord {
        let mut tags = Map::new();
        tags.insert(APPLICATION_TAG.to_string(), Value::String(self.name));
        tags.insert("business-unit".to_string(), Value::String(self.business_unit));
        tags.insert(
            "infrastructure-support".to_string(),
            Value::String(self.infrastructure_support),
        );
        tags.insert("owner".to_string(), Value::String(self.owner));
        tags.insert("slack-channel".to_string(), Value::String(self.slack_channel));
        tags.insert(
            "critical-national-infrastructure".to_string(),
            Value::Bool(self.critical_national_infrastructure),
        );

        EnvironmentRecord {
            account_type: Some(config.default_account_type.clone()),
            environments: vec![Environment::new(
                config.creation_environment.clone(),
                vec![AccessGrant::new(
                    self.sso_group,
                    config.creation_access_level.clone(),
                )],
            )],
            tags: Some(tags),
            github_oidc_team_repositories: Some(Vec::new()),
            go_live_date: Some(self.go_live_date),
            codeowners: self.codeowners,
            extra: Map::new(),
        }
    }
}

/// Check that an application name can be used as a store key
///
/// # Errors
/// `ValidationError::InvalidValue` at `tags.application` for blank names,
/// names containing path separators, and `.`/`..`.
pub fn check_application_name(name: &str) -> Result<(), ValidationError> {
    let path = FieldPath::key("tags").child(APPLICATION_TAG);
    if name.trim().is_empty() {
        return Err(ValidationError::invalid_value(path, "must be a non-empty string"));
    }
    if name != name.trim() {
        return Err(ValidationError::invalid_value(
            path,
            "must not have leading or trailing whitespace",
        ));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ValidationError::invalid_value(
            path,
            format!("'{name}' cannot be used as a record name"),
        ));
    }
    Ok(())
}
