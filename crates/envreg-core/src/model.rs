//! Typed record model
//!
//! [`EnvironmentRecord`] mirrors the persisted JSON document. Keys the model
//! does not know about are carried in `extra` maps so a load/save cycle never
//! drops data, and absent optional keys stay absent.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Tag carrying the application's canonical name
pub const APPLICATION_TAG: &str = "application";

/// One application's environment-configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    #[serde(rename = "account-type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,

    /// Deployment stages, in file order
    pub environments: Vec<Environment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Map<String, Value>>,

    #[serde(
        rename = "github-oidc-team-repositories",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub github_oidc_team_repositories: Option<Vec<String>>,

    #[serde(rename = "go-live-date", default, skip_serializing_if = "Option::is_none")]
    pub go_live_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codeowners: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvironmentRecord {
    /// Convert a validated document into the typed model
    ///
    /// # Errors
    /// Returns `RegistryError::Model` if a field the validator does not
    /// inspect (e.g. `go-live-date`) has an unexpected type.
    pub fn from_value(record: &str, value: Value) -> RegistryResult<Self> {
        serde_json::from_value(value).map_err(|source| RegistryError::Model {
            record: record.to_string(),
            source,
        })
    }

    /// Convert back into a JSON document
    #[must_use]
    pub fn to_value(&self) -> Value {
        // all fields are strings, sequences and maps; serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Find environment by exact name
    #[must_use]
    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.name == name)
    }

    /// Value of `tags.application`, if it is a string
    #[must_use]
    pub fn application(&self) -> Option<&str> {
        self.tags.as_ref()?.get(APPLICATION_TAG)?.as_str()
    }
}

/// Named deployment stage within a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,

    /// `None` and `Some(vec![])` both mean "no grants"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Vec<AccessGrant>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Environment {
    /// Create environment with the given grants
    #[must_use]
    pub fn new(name: impl Into<String>, access: Vec<AccessGrant>) -> Self {
        Self {
            name: name.into(),
            access: Some(access),
            extra: Map::new(),
        }
    }

    /// Grants, empty when `access` is absent
    #[inline]
    #[must_use]
    pub fn grants(&self) -> &[AccessGrant] {
        self.access.as_deref().unwrap_or_default()
    }

    /// Check for a grant with the same identity key
    #[inline]
    #[must_use]
    pub fn has_grant(&self, grant: &AccessGrant) -> bool {
        self.grants().iter().any(|existing| existing.same_identity(grant))
    }

    /// JSON form: `name`, then `access` if set, then unknown keys
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(access) = &self.access {
            object.insert(
                "access".to_string(),
                Value::Array(access.iter().map(AccessGrant::to_value).collect()),
            );
        }
        object.extend(self.extra.clone());
        Value::Object(object)
    }
}

/// A (SSO group, permission level) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub sso_group_name: String,
    pub level: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessGrant {
    /// Create grant
    #[inline]
    #[must_use]
    pub fn new(sso_group_name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            sso_group_name: sso_group_name.into(),
            level: level.into(),
            extra: Map::new(),
        }
    }

    /// Deduplication key
    #[inline]
    #[must_use]
    pub fn identity(&self) -> (&str, &str) {
        (&self.sso_group_name, &self.level)
    }

    /// Two grants are the same iff group and level both match
    #[inline]
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    /// Check a raw access entry for the same identity key
    #[must_use]
    pub fn matches(&self, entry: &Value) -> bool {
        entry.get("sso_group_name").and_then(Value::as_str) == Some(self.sso_group_name.as_str())
            && entry.get("level").and_then(Value::as_str) == Some(self.level.as_str())
    }

    /// JSON form: `sso_group_name`, `level`, then unknown keys
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "sso_group_name".to_string(),
            Value::String(self.sso_group_name.clone()),
        );
        object.insert("level".to_string(), Value::String(self.level.clone()));
        object.extend(self.extra.clone());
        Value::Object(object)
    }
}

impl Display for AccessGrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sso_group_name, self.level)
    }
}

/// Error parsing a `group:level` grant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grant '{0}': expected <sso_group>:<level> with both parts non-empty")]
pub struct GrantParseError(pub String);

impl FromStr for AccessGrant {
    type Err = GrantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, level) = s
            .rsplit_once(':')
            .ok_or_else(|| GrantParseError(s.to_string()))?;
        let (group, level) = (group.trim(), level.trim());
        if group.is_empty() || level.is_empty() {
            return Err(GrantParseError(s.to_string()));
        }
        Ok(Self::new(group, level))
    }
}
