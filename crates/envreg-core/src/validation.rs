//! Schema validation for environment records
//!
//! Checks an untrusted JSON document against the record shape. Validation is
//! fail-fast: the first violated rule is returned with its field path.

use crate::error::ValidationError;
use crate::path::FieldPath;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Validator tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Reject records where two environments share a `name`
    pub unique_environment_names: bool,
}

/// Record schema validator
///
/// Pure and read-only: a document is never corrected, only judged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator {
    options: ValidatorOptions,
}

impl SchemaValidator {
    /// Create validator with default (lenient) options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create validator with explicit options
    #[inline]
    #[must_use]
    pub fn with_options(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validator options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Validate a document
    ///
    /// Rules, in order:
    /// 1. `environments` is a list
    /// 2. each environment is an object with a non-empty `name`, and its
    ///    `access` (when present) is a list of objects with non-empty
    ///    `sso_group_name` and `level`
    /// 3. `codeowners`, when present, is a list of strings
    /// 4. `tags`, when present, is an object
    ///
    /// # Errors
    /// - `ValidationError::InvalidShape` for missing fields or wrong types
    /// - `ValidationError::InvalidValue` for empty or blank strings
    pub fn validate(&self, document: &Value) -> Result<(), ValidationError> {
        let root = document
            .as_object()
            .ok_or_else(|| ValidationError::invalid_shape(FieldPath::root(), "an object"))?;

        let environments_path = FieldPath::key("environments");
        let environments = root
            .get("environments")
            .and_then(Value::as_array)
            .ok_or_else(|| ValidationError::invalid_shape(environments_path.clone(), "a list"))?;

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, environment) in environments.iter().enumerate() {
            let path = environments_path.index(i);
            let name = validate_environment(environment, &path)?;

            if self.options.unique_environment_names {
                if let Some(first) = seen.insert(name, i) {
                    return Err(ValidationError::invalid_value(
                        path.child("name"),
                        format!("duplicates environments[{first}].name '{name}'"),
                    ));
                }
            }
        }

        if let Some(codeowners) = root.get("codeowners") {
            validate_codeowners(codeowners)?;
        }

        if let Some(tags) = root.get("tags") {
            if !tags.is_object() {
                return Err(ValidationError::invalid_shape(
                    FieldPath::key("tags"),
                    "an object",
                ));
            }
        }

        Ok(())
    }
}

/// Validate with default options
///
/// # Errors
/// See [`SchemaValidator::validate`].
pub fn validate(document: &Value) -> Result<(), ValidationError> {
    SchemaValidator::new().validate(document)
}

/// Returns the environment's name on success
fn validate_environment<'a>(
    environment: &'a Value,
    path: &FieldPath,
) -> Result<&'a str, ValidationError> {
    let object = environment
        .as_object()
        .ok_or_else(|| ValidationError::invalid_shape(path.clone(), "an object"))?;

    let name = required_string(object, "name", path)?;

    // null is treated the same as an absent key: no grants yet
    let access = match object.get("access") {
        None | Some(Value::Null) => return Ok(name),
        Some(access) => access,
    };

    let access_path = path.child("access");
    let entries = access
        .as_array()
        .ok_or_else(|| ValidationError::invalid_shape(access_path.clone(), "a list"))?;

    for (j, entry) in entries.iter().enumerate() {
        let entry_path = access_path.index(j);
        let grant = entry
            .as_object()
            .ok_or_else(|| ValidationError::invalid_shape(entry_path.clone(), "an object"))?;
        required_string(grant, "sso_group_name", &entry_path)?;
        required_string(grant, "level", &entry_path)?;
    }

    Ok(name)
}

fn validate_codeowners(codeowners: &Value) -> Result<(), ValidationError> {
    let path = FieldPath::key("codeowners");
    let owners = codeowners
        .as_array()
        .ok_or_else(|| ValidationError::invalid_shape(path.clone(), "a list of strings"))?;

    // only the type is checked here; empty strings are allowed
    if let Some(position) = owners.iter().position(|owner| !owner.is_string()) {
        return Err(ValidationError::invalid_shape(path.index(position), "a string"));
    }
    Ok(())
}

/// Non-empty (after trim) string member
fn required_string<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    parent: &FieldPath,
) -> Result<&'a str, ValidationError> {
    let path = parent.child(key);
    let value = object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::invalid_shape(path.clone(), "a non-empty string"))?;

    if value.trim().is_empty() {
        return Err(ValidationError::invalid_value(
            path,
            "must be a non-empty string",
        ));
    }
    Ok(value)
}
