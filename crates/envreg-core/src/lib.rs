//! envreg Core
//!
//! Per-application environment records: schema validation, duplicate
//! detection and idempotent access-grant merging.
//!
//! # Core Operations
//!
//! - **Validate**: [`validation::SchemaValidator`] checks an untrusted JSON
//!   document, fail-fast, reporting the offending field path
//! - **Detect**: [`detector::exists`] decides whether an application is
//!   registered, by store key or by `tags.application`
//! - **Merge**: [`merge::merge_access`] appends grants to an environment,
//!   skipping grants already present
//!
//! # Architecture
//!
//! ```text
//! DocumentStore → Value → SchemaValidator → EnvironmentRecord → merge_access → DocumentStore
//!                   ↑___________↓
//!                  detector (key, then tags.application scan)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use envreg_core::prelude::*;
//!
//! let config = RegistryConfig::new().with_root("environments");
//! let mut registry = Registry::new(config.directory_store(), config);
//!
//! let outcome = registry.amend_access(
//!     "orders",
//!     "development",
//!     &[AccessGrant::new("team-a", "developer")],
//! )?;
//! println!("added {} grants", outcome.added);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod create;
pub mod detector;
pub mod error;
pub mod merge;
pub mod model;
pub mod path;
pub mod registry;
pub mod store;
pub mod validation;

// Re-exports for convenience
pub use config::RegistryConfig;
pub use create::NewApplication;
pub use detector::{exists, ApplicationIndex, Registration};
pub use error::{ConfigError, RegistryError, RegistryResult, ValidationError};
pub use merge::{merge_access, merge_access_document, merged, MergeOutcome};
pub use model::{AccessGrant, Environment, EnvironmentRecord, GrantParseError};
pub use path::FieldPath;
pub use registry::Registry;
pub use store::{DirectoryStore, DocumentStore, MemoryStore, StoredDocument};
pub use validation::{validate, SchemaValidator, ValidatorOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with environment records
    pub use crate::config::RegistryConfig;
    pub use crate::create::NewApplication;
    pub use crate::error::{RegistryError, ValidationError};
    pub use crate::merge::MergeOutcome;
    pub use crate::model::{AccessGrant, Environment, EnvironmentRecord};
    pub use crate::registry::Registry;
    pub use crate::store::{DirectoryStore, DocumentStore, MemoryStore};
}
