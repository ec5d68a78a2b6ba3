//! Testing utilities for envreg workspace
//!
//! Shared record fixtures and temp-directory seeding. Fixtures are plain
//! JSON so this crate stays independent of `envreg-core`.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub fn grant(sso_group_name: &str, level: &str) -> Value {
    json!({ "sso_group_name": sso_group_name, "level": level })
}

/// Record shaped like a freshly created one
pub fn sample_record(application: &str) -> Value {
    json!({
        "account-type": "member",
        "environments": [
            {
                "name": "development",
                "access": [grant("modernisation-platform", "developer")]
            }
        ],
        "tags": {
            "application": application,
            "business-unit": "Platforms",
            "infrastructure-support": "platform@example.com",
            "owner": "Platform: platform@example.com",
            "slack-channel": "platform",
            "critical-national-infrastructure": false
        },
        "github-oidc-team-repositories": [],
        "go-live-date": ""
    })
}

/// Record with several environments, one without `access`
pub fn multi_environment_record(application: &str) -> Value {
    json!({
        "account-type": "member",
        "environments": [
            { "name": "development", "access": [grant("team-a", "developer")] },
            { "name": "test", "access": [] },
            { "name": "production" }
        ],
        "tags": { "application": application },
        "codeowners": ["@org/team-a"]
    })
}

pub fn write_record(dir: &Path, file_name: &str, document: &Value) {
    let text = serde_json::to_string_pretty(document).unwrap();
    fs::write(dir.join(file_name), text + "\n").unwrap();
}

/// Temp directory holding `(file name, raw contents)` pairs
pub fn seed_directory(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

pub fn read_record(dir: &Path, file_name: &str) -> Value {
    let text = fs::read_to_string(dir.join(file_name)).unwrap();
    serde_json::from_str(&text).unwrap()
}
