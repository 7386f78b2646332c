//! Wire types of the HNAS v9 storage REST API.
//!
//! Response fields are optional because the array omits what it doesn't
//! know; callers decide which ones they require.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filesystem {
    #[serde(default)]
    pub filesystem_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub virtual_server_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FilesystemList {
    #[serde(default)]
    pub filesystems: Vec<Filesystem>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FilesystemDetail {
    #[serde(default)]
    pub filesystem: Option<Filesystem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Epoch seconds, as a number or a numeric string depending on firmware
    #[serde(default)]
    pub creation_time: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSnapshotRequest<'a> {
    pub filesystem_id: &'a str,
    pub display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_search_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_interval: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SnapshotCreated {
    #[serde(default)]
    pub snapshot: Option<Snapshot>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SnapshotList {
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Body of `POST /filesystem-shares/cifs`. Everything past `comment` is the
/// fixed default share profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateShareRequest<'a> {
    pub filesystem_id: &'a str,
    pub virtual_server_id: &'a str,
    pub name: &'a str,
    pub filesystem_path: String,
    pub comment: String,
    pub ensure_path_exists: bool,
    /// Empty: no IP restrictions
    pub access_config: &'static str,
    pub cache_option: &'static str,
    pub continuously_available: bool,
    pub encrypted_access: bool,
    #[serde(rename = "isABEEnabled")]
    pub is_abe_enabled: bool,
    pub is_follow_global_symbolic_links: bool,
    pub is_follow_symbolic_links: bool,
    pub is_force_file_name_to_lowercase: bool,
    pub is_scan_for_viruses_enabled: bool,
    /// -1: unlimited
    pub max_concurrent_users: i32,
    pub snapshot_option: &'static str,
    pub transfer_to_replication_target_setting: &'static str,
    pub user_home_directory_mode: &'static str,
    /// false keeps the default Everyone permissions
    pub no_default_security: bool,
}

impl<'a> CreateShareRequest<'a> {
    pub fn for_snapshot(
        filesystem_id: &'a str,
        virtual_server_id: &'a str,
        name: &'a str,
        snapshot_name: &str,
        created_at: chrono::DateTime<chrono::Local>,
    ) -> Self {
        Self {
            filesystem_id,
            virtual_server_id,
            name,
            filesystem_path: snapshot_share_path(snapshot_name),
            comment: format!(
                "Veeam backup snapshot share created at {}",
                created_at.format("%Y-%m-%dT%H:%M:%S")
            ),
            ensure_path_exists: false,
            access_config: "",
            cache_option: "MANUAL_CACHING_DOCS",
            continuously_available: false,
            encrypted_access: false,
            is_abe_enabled: false,
            is_follow_global_symbolic_links: false,
            is_follow_symbolic_links: false,
            is_force_file_name_to_lowercase: false,
            is_scan_for_viruses_enabled: false,
            max_concurrent_users: -1,
            snapshot_option: "SHOW_AND_ALLOW_ACCESS",
            transfer_to_replication_target_setting: "USE_FS_DEFAULT",
            user_home_directory_mode: "OFF",
            no_default_security: false,
        }
    }
}

/// Path of a snapshot inside the filesystem's hidden `.snapshot` namespace.
pub fn snapshot_share_path(snapshot_name: &str) -> String {
    format!("\\.snapshot\\{}", snapshot_name)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShareCreated {
    #[serde(default)]
    pub filesystem_share: Option<Share>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShareList {
    #[serde(default)]
    pub filesystem_shares: Vec<Share>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDevice {
    #[serde(default)]
    pub name: Option<String>,
}
