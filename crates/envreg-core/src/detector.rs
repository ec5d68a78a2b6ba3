//! Duplicate application detection
//!
//! An application counts as registered if a document is filed under its
//! name, or if any stored document's `tags.application` matches it
//! case-insensitively. The second check catches legacy records whose file
//! name drifted from the application they describe.
//!
//! The fallback scan parses every stored document: O(n) per check. Callers
//! answering many queries against one store can build an [`ApplicationIndex`]
//! once instead.

use crate::error::RegistryResult;
use crate::model::APPLICATION_TAG;
use crate::store::{DocumentStore, StoredDocument};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Where an existing registration was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A document is filed under the application name itself
    StoreKey(String),
    /// A document under a different key carries the name in `tags.application`
    ApplicationTag { key: String, application: String },
}

impl Registration {
    /// Store key of the matching document
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::StoreKey(key) | Self::ApplicationTag { key, .. } => key,
        }
    }
}

/// Check whether `app_name` is already registered in `store`
///
/// # Errors
/// Only store I/O failures; unparseable peer documents are skipped.
pub fn exists<S: DocumentStore + ?Sized>(app_name: &str, store: &S) -> RegistryResult<bool> {
    Ok(find_registration(app_name, store)?.is_some())
}

/// Locate the registration for `app_name`, if any
///
/// # Errors
/// Only store I/O failures; unparseable peer documents are skipped.
pub fn find_registration<S: DocumentStore + ?Sized>(
    app_name: &str,
    store: &S,
) -> RegistryResult<Option<Registration>> {
    if store.contains(app_name)? {
        tracing::debug!(app_name, "registration found by store key");
        return Ok(Some(Registration::StoreKey(app_name.to_string())));
    }

    let wanted = app_name.to_lowercase();
    for document in store.list_all()? {
        if let Some(application) = tagged_application(&document) {
            if application.to_lowercase() == wanted {
                tracing::debug!(app_name, key = %document.key, "registration found by application tag");
                return Ok(Some(Registration::ApplicationTag {
                    key: document.key,
                    application,
                }));
            }
        }
    }
    Ok(None)
}

/// `tags.application` of a stored document, or `None` if the document cannot
/// be parsed or the tag is missing or not a string
fn tagged_application(document: &StoredDocument) -> Option<String> {
    let value = match document.parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(key = %document.key, error = %e, "skipping unparseable document");
            return None;
        }
    };
    match value.get("tags")?.get(APPLICATION_TAG)? {
        Value::String(application) => Some(application.clone()),
        _ => None,
    }
}

/// Pre-scanned view of a store's registrations
///
/// Answers the same question as [`exists`] without rescanning the store.
/// The index is a snapshot: documents written after [`ApplicationIndex::build`]
/// are not visible.
#[derive(Debug, Clone, Default)]
pub struct ApplicationIndex {
    keys: HashSet<String>,
    /// lowercased `tags.application` -> store key
    tags: HashMap<String, String>,
}

impl ApplicationIndex {
    /// Scan the store once
    ///
    /// # Errors
    /// Only store I/O failures.
    pub fn build<S: DocumentStore + ?Sized>(store: &S) -> RegistryResult<Self> {
        let mut index = Self::default();
        for document in store.list_all()? {
            if let Some(application) = tagged_application(&document) {
                index
                    .tags
                    .entry(application.to_lowercase())
                    .or_insert_with(|| document.key.clone());
            }
            index.keys.insert(document.key);
        }
        tracing::debug!(
            documents = index.keys.len(),
            tagged = index.tags.len(),
            "application index built"
        );
        Ok(index)
    }

    /// Same semantics as [`exists`]
    #[must_use]
    pub fn contains(&self, app_name: &str) -> bool {
        self.keys.contains(app_name) || self.tags.contains_key(&app_name.to_lowercase())
    }

    /// Store key of the document registering `app_name`
    #[must_use]
    pub fn key_for(&self, app_name: &str) -> Option<&str> {
        if let Some(key) = self.keys.get(app_name) {
            return Some(key.as_str());
        }
        self.tags.get(&app_name.to_lowercase()).map(String::as_str)
    }

    /// Number of indexed documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no documents were indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
