//! Idempotent access-grant merging
//!
//! Merging only ever appends: existing grants keep their position, new grants
//! are added in the order they were proposed, and a grant whose
//! (`sso_group_name`, `level`) pair is already present is skipped.
//!
//! [`merge_access`] works on the typed model. [`merge_access_document`] applies
//! the same rules directly to a stored JSON document, leaving every key it
//! does not append to untouched and in place.

use crate::error::ValidationError;
use crate::model::{AccessGrant, Environment, EnvironmentRecord};
use crate::path::FieldPath;
use serde_json::Value;

/// What a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Grants appended to the environment
    pub added: usize,
    /// Proposed grants that were already present
    pub skipped: usize,
    /// Environment did not exist and was appended to the record
    pub environment_created: bool,
}

impl MergeOutcome {
    /// Check if the record was left untouched
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added == 0 && !self.environment_created
    }
}

/// Merge `grants` into the environment named `environment`
///
/// If no environment has that exact name, `{name, access: grants}` is
/// appended to the end of `environments` with the grants in proposal order.
/// Environment names are assumed unique; the first match wins.
pub fn merge_access(
    record: &mut EnvironmentRecord,
    environment: &str,
    grants: &[AccessGrant],
) -> MergeOutcome {
    let Some(position) = record
        .environments
        .iter()
        .position(|env| env.name == environment)
    else {
        record
            .environments
            .push(Environment::new(environment, grants.to_vec()));
        return MergeOutcome {
            added: grants.len(),
            skipped: 0,
            environment_created: true,
        };
    };

    let access = record.environments[position]
        .access
        .get_or_insert_with(Vec::new);
    let mut outcome = MergeOutcome::default();
    for grant in grants {
        if access.iter().any(|existing| existing.same_identity(grant)) {
            outcome.skipped += 1;
        } else {
            access.push(grant.clone());
            outcome.added += 1;
        }
    }
    outcome
}

/// By-value form of [`merge_access`]
#[must_use]
pub fn merged(
    mut record: EnvironmentRecord,
    environment: &str,
    grants: &[AccessGrant],
) -> EnvironmentRecord {
    merge_access(&mut record, environment, grants);
    record
}

/// Merge `grants` into the environment named `environment` of a raw document
///
/// Same rules as [`merge_access`]. Only the target environment's `access`
/// list is touched (created at the end of the environment object when absent
/// or `null`), or a new environment object is appended. Key order, `null`
/// values and unknown keys elsewhere are left exactly as they were.
///
/// # Errors
/// `ValidationError::InvalidShape` if `environments`, the target environment
/// or its `access` has the wrong shape. The document is unchanged on error.
pub fn merge_access_document(
    document: &mut Value,
    environment: &str,
    grants: &[AccessGrant],
) -> Result<MergeOutcome, ValidationError> {
    let environments_path = FieldPath::key("environments");
    let environments = document
        .get_mut("environments")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| ValidationError::invalid_shape(environments_path.clone(), "a list"))?;

    let position = environments
        .iter()
        .position(|env| env.get("name").and_then(Value::as_str) == Some(environment));
    let Some(position) = position else {
        environments.push(Environment::new(environment, grants.to_vec()).to_value());
        return Ok(MergeOutcome {
            added: grants.len(),
            skipped: 0,
            environment_created: true,
        });
    };

    let env_path = environments_path.index(position);
    let entry = environments[position]
        .as_object_mut()
        .ok_or_else(|| ValidationError::invalid_shape(env_path.clone(), "an object"))?;

    let existing: &[Value] = match entry.get("access") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(access)) => access.as_slice(),
        Some(_) => {
            return Err(ValidationError::invalid_shape(
                env_path.child("access"),
                "a list",
            ))
        }
    };

    let mut outcome = MergeOutcome::default();
    let mut fresh: Vec<Value> = Vec::new();
    for grant in grants {
        let known = existing.iter().any(|entry| grant.matches(entry))
            || fresh.iter().any(|entry| grant.matches(entry));
        if known {
            outcome.skipped += 1;
        } else {
            fresh.push(grant.to_value());
            outcome.added += 1;
        }
    }

    if !fresh.is_empty() {
        let access = entry
            .entry("access")
            .or_insert_with(|| Value::Array(Vec::new()));
        if access.is_null() {
            *access = Value::Array(Vec::new());
        }
        if let Value::Array(access) = access {
            access.extend(fresh);
        }
    }
    Ok(outcome)
}
