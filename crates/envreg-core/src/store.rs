//! Document stores
//!
//! A store holds one JSON document per application, addressed by a key (the
//! application name). [`DirectoryStore`] maps keys to `<root>/<key>.<ext>`
//! files; [`MemoryStore`] keeps documents in memory.

use crate::error::{RegistryError, RegistryResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A stored document in raw form
///
/// Parsing is left to the consumer so one malformed document does not poison
/// a scan over the whole store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Store key the document is filed under
    pub key: String,
    /// Raw document text
    pub raw: String,
}

impl StoredDocument {
    /// Parse the raw text as JSON
    ///
    /// # Errors
    /// Returns `RegistryError::Parse` naming the key on invalid JSON.
    pub fn parse(&self) -> RegistryResult<Value> {
        parse_document(&self.key, &self.raw)
    }
}

/// Collection of record documents
pub trait DocumentStore {
    /// Check whether a document is filed under `key`
    fn contains(&self, key: &str) -> RegistryResult<bool>;

    /// Load and parse the document filed under `key`
    fn get(&self, key: &str) -> RegistryResult<Option<Value>>;

    /// Every stored document, unparsed, in key order
    fn list_all(&self) -> RegistryResult<Vec<StoredDocument>>;

    /// Write a whole document under `key`, replacing any previous one
    fn put(&mut self, key: &str, document: &Value) -> RegistryResult<()>;
}

/// Serialize a document the way it is persisted: two-space indent, trailing newline
///
/// # Errors
/// Only fails for documents with non-string map keys, which JSON values cannot hold.
pub fn render_document(document: &Value) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}

fn parse_document(key: &str, raw: &str) -> RegistryResult<Value> {
    serde_json::from_str(raw).map_err(|source| RegistryError::Parse {
        record: key.to_string(),
        source,
    })
}

/// One file per record under a root directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    extension: String,
}

impl DirectoryStore {
    /// Create store rooted at `root` with the default `json` extension
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, "json")
    }

    /// Create store with a specific file extension (without dot)
    #[inline]
    #[must_use]
    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a key
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{}", self.extension))
    }

    fn key_of(&self, path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != self.extension {
            return None;
        }
        path.file_stem()?.to_str().map(str::to_string)
    }
}

impl DocumentStore for DirectoryStore {
    fn contains(&self, key: &str) -> RegistryResult<bool> {
        Ok(self.path_for(key).is_file())
    }

    fn get(&self, key: &str) -> RegistryResult<Option<Value>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => parse_document(key, &raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::io_error(path, e)),
        }
    }

    fn list_all(&self) -> RegistryResult<Vec<StoredDocument>> {
        // a root that does not exist yet holds no records
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RegistryError::io_error(&self.root, e)),
        };

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| RegistryError::io_error(&self.root, e))?
                .path();
            if !path.is_file() {
                continue;
            }
            let Some(key) = self.key_of(&path) else {
                continue;
            };
            let raw = fs::read_to_string(&path).map_err(|e| RegistryError::io_error(&path, e))?;
            documents.push(StoredDocument { key, raw });
        }
        documents.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(documents)
    }

    fn put(&mut self, key: &str, document: &Value) -> RegistryResult<()> {
        let path = self.path_for(key);
        let text = render_document(document).map_err(|source| RegistryError::Serialize {
            record: key.to_string(),
            source,
        })?;
        fs::create_dir_all(&self.root).map_err(|e| RegistryError::io_error(&self.root, e))?;
        fs::write(&path, text).map_err(|e| RegistryError::io_error(path, e))
    }
}

/// In-memory store holding raw document text
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw text under `key`, valid JSON or not
    pub fn insert_raw(&mut self, key: impl Into<String>, raw: impl Into<String>) {
        self.documents.insert(key.into(), raw.into());
    }

    /// Raw text stored under `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.documents.get(key).map(String::as_str)
    }

    /// Number of stored documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn contains(&self, key: &str) -> RegistryResult<bool> {
        Ok(self.documents.contains_key(key))
    }

    fn get(&self, key: &str) -> RegistryResult<Option<Value>> {
        self.documents
            .get(key)
            .map(|raw| parse_document(key, raw))
            .transpose()
    }

    fn list_all(&self) -> RegistryResult<Vec<StoredDocument>> {
        Ok(self
            .documents
            .iter()
            .map(|(key, raw)| StoredDocument {
                key: key.clone(),
                raw: raw.clone(),
            })
            .collect())
    }

    fn put(&mut self, key: &str, document: &Value) -> RegistryResult<()> {
        let text = render_document(document).map_err(|source| RegistryError::Serialize {
            record: key.to_string(),
            source,
        })?;
        self.documents.insert(key.to_string(), text);
        Ok(())
    }
}
