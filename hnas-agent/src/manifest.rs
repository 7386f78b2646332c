//! Manifest handed from the pre-backup hook to the post-backup hook.
//!
//! The pre hook records every snapshot (and share) it created; the post hook
//! reads it back to know what to tear down. The file carries a schema
//! `version` so a reader never silently misinterprets a newer layout.

use crate::utils::{HookError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Snapshot manifest, serialized as JSON at the configured manifest path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// Run timestamp shared by every snapshot name of the run
    pub timestamp: String,
    pub snapshots: Vec<ManifestEntry>,
    pub config: ManifestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    pub host: String,
    #[serde(default)]
    pub tag: Option<String>,
}

/// One snapshotted filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filesystem_id: String,
    pub filesystem_label: String,
    pub snapshot_name: String,
    /// Array object ID; absent if the create response didn't carry one
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub creation_time: Option<serde_json::Value>,
    #[serde(default)]
    pub search_tag: Option<String>,
    #[serde(default)]
    pub share: Option<ShareRecord>,
}

/// SMB share exposing a manifest entry's snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl Manifest {
    pub fn new(timestamp: impl Into<String>, host: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            timestamp: timestamp.into(),
            snapshots: Vec::new(),
            config: ManifestConfig {
                host: host.into(),
                tag,
            },
        }
    }

    /// Write the manifest, creating parent directories. The file is written
    /// to a temporary sibling and renamed into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Read the manifest. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;

        match raw.get("version").and_then(|v| v.as_u64()) {
            Some(v) if v <= u64::from(MANIFEST_VERSION) => {}
            Some(v) => {
                return Err(HookError::Manifest(format!(
                    "unsupported manifest version {} (newest supported is {})",
                    v, MANIFEST_VERSION
                )))
            }
            None => return Err(HookError::Manifest("manifest has no version field".into())),
        }

        Ok(Some(serde_json::from_value(raw)?))
    }
}
