//! HNAS management API client.
//!
//! Every operation is best effort: failures are logged here and come back as
//! `None`, an empty list or [`DeleteOutcome::Failed`], so a run can carry on
//! with the next filesystem. Only [`HnasClient::check_connection`] returns an error,
//! because an unreachable array is fatal at start-up.

pub mod auth;
pub mod models;

pub use auth::Auth;
pub use models::{FileDevice, Filesystem, Share, Snapshot};

use crate::config::Config;
use crate::utils::{HookError, Result};
use models::{
    CreateShareRequest, CreateSnapshotRequest, FilesystemDetail, FilesystemList, ShareCreated,
    ShareList, SnapshotCreated, SnapshotList,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Timeout for lookups and the connectivity check.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for create and delete calls.
pub const MUTATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Path segment that lists snapshots regardless of their search tag.
pub const ANY_SEARCH_TAG: &str = "null";

/// Failure of a single API call.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Result of a delete call. A 404 means the object is already gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
    Failed,
}

impl DeleteOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, DeleteOutcome::Failed)
    }
}

/// Configured client for one array. Credentials are attached in
/// [`HnasClient::request`], never per call site.
#[derive(Debug, Clone)]
pub struct HnasClient {
    http: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl HnasClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(
            config.base_url(),
            Auth::from_credentials(&config.username, &config.password),
            config.verify_ssl,
        )
    }

    /// Build a client against an explicit base URL (everything before
    /// `/filesystems`, `/filesystem-snapshots`, ...).
    pub fn with_base_url(base_url: impl Into<String>, auth: Auth, verify_ssl: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, timeout: Duration) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.auth
            .apply(self.http.request(method, url))
            .timeout(timeout)
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Response, ApiError> {
        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status { status, body })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path, READ_TIMEOUT)).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    async fn delete(&self, path: &str, what: &str, id: &str) -> DeleteOutcome {
        info!("Deleting {} with object ID: {}", what, id);

        match self.send(self.request(Method::DELETE, path, MUTATION_TIMEOUT)).await {
            Ok(_) => {
                info!("Successfully deleted {}: {}", what, id);
                DeleteOutcome::Deleted
            }
            Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                warn!("{} '{}' not found (may have been already deleted)", what, id);
                DeleteOutcome::AlreadyGone
            }
            Err(e) => {
                error!("Failed to delete {} {}: {}", what, id, e);
                DeleteOutcome::Failed
            }
        }
    }

    /// Fetch the device identity. Used once per run to fail fast on bad
    /// connectivity or rejected credentials.
    pub async fn check_connection(&self) -> Result<FileDevice> {
        match self.get_json::<FileDevice>("/file-devices").await {
            Ok(device) => {
                info!(
                    "Connected to HNAS: {}",
                    device.name.as_deref().unwrap_or("Unknown")
                );
                Ok(device)
            }
            Err(e) => {
                error!("Failed to connect to HNAS at {}: {}", self.base_url, e);
                Err(HookError::Connection(e.to_string()))
            }
        }
    }

    pub async fn list_filesystems(&self) -> Vec<Filesystem> {
        match self.get_json::<FilesystemList>("/filesystems").await {
            Ok(list) => list.filesystems,
            Err(e) => {
                error!("Failed to get filesystems list: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get_filesystem(&self, filesystem_id: &str) -> Option<Filesystem> {
        match self
            .get_json::<FilesystemDetail>(&format!("/filesystems/{}", filesystem_id))
            .await
        {
            Ok(detail) => {
                if detail.filesystem.is_none() {
                    warn!("Filesystem {} response carried no filesystem object", filesystem_id);
                }
                detail.filesystem
            }
            Err(e) => {
                error!("Failed to get filesystem info for {}: {}", filesystem_id, e);
                None
            }
        }
    }

    /// First filesystem whose label matches exactly (case-sensitive).
    pub async fn find_filesystem_by_label(&self, label: &str) -> Option<Filesystem> {
        self.list_filesystems()
            .await
            .into_iter()
            .find(|fs| fs.label.as_deref() == Some(label))
    }

    pub async fn create_snapshot(
        &self,
        filesystem_id: &str,
        display_name: &str,
        search_tag: Option<&str>,
        retention_interval: Option<u32>,
    ) -> Option<Snapshot> {
        let body = CreateSnapshotRequest {
            filesystem_id,
            display_name,
            app_search_id: search_tag,
            retention_interval,
        };

        info!("Creating snapshot '{}' for filesystem '{}'", display_name, filesystem_id);

        let request = self
            .request(Method::POST, "/filesystem-snapshots", MUTATION_TIMEOUT)
            .json(&body);

        let created: SnapshotCreated = match self.send(request).await {
            Ok(response) => match response.json().await {
                Ok(created) => created,
                Err(e) => {
                    error!("Failed to read snapshot creation response: {}", e);
                    return None;
                }
            },
            Err(e) => {
                error!("Failed to create snapshot '{}': {}", display_name, e);
                return None;
            }
        };

        match created.snapshot {
            Some(snapshot) => {
                info!(
                    "Successfully created snapshot: {}",
                    snapshot.display_name.as_deref().unwrap_or(display_name)
                );
                Some(snapshot)
            }
            None => {
                error!("Snapshot creation for '{}' returned no snapshot object", display_name);
                None
            }
        }
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str) -> DeleteOutcome {
        self.delete(&format!("/filesystem-snapshots/{}", snapshot_id), "snapshot", snapshot_id)
            .await
    }

    /// Snapshots of a filesystem carrying `search_tag`, or all of them when
    /// the tag is `None`.
    pub async fn list_snapshots(&self, filesystem_id: &str, search_tag: Option<&str>) -> Vec<Snapshot> {
        let path = format!(
            "/filesystem-snapshots/{}/{}",
            filesystem_id,
            search_tag.unwrap_or(ANY_SEARCH_TAG)
        );
        match self.get_json::<SnapshotList>(&path).await {
            Ok(list) => list.snapshots,
            Err(e) => {
                error!("Failed to list snapshots for filesystem {}: {}", filesystem_id, e);
                Vec::new()
            }
        }
    }

    /// Create an SMB share named `share_name` exposing `snapshot_name` from
    /// the filesystem's `.snapshot` namespace.
    pub async fn create_share(
        &self,
        filesystem_id: &str,
        virtual_server_id: &str,
        share_name: &str,
        snapshot_name: &str,
    ) -> Option<Share> {
        let body = CreateShareRequest::for_snapshot(
            filesystem_id,
            virtual_server_id,
            share_name,
            snapshot_name,
            chrono::Local::now(),
        );

        info!("Creating SMB share '{}' for snapshot '{}'", share_name, snapshot_name);

        let request = self
            .request(Method::POST, "/filesystem-shares/cifs", MUTATION_TIMEOUT)
            .json(&body);

        let created: ShareCreated = match self.send(request).await {
            Ok(response) => match response.json().await {
                Ok(created) => created,
                Err(e) => {
                    error!("Failed to read SMB share creation response: {}", e);
                    return None;
                }
            },
            Err(e) => {
                error!("Failed to create SMB share '{}': {}", share_name, e);
                return None;
            }
        };

        if created.filesystem_share.is_some() {
            info!("Successfully created SMB share: {}", share_name);
        } else {
            error!("SMB share creation for '{}' returned no share object", share_name);
        }
        created.filesystem_share
    }

    pub async fn delete_share(&self, share_id: &str) -> DeleteOutcome {
        self.delete(&format!("/filesystem-shares/cifs/{}", share_id), "SMB share", share_id)
            .await
    }

    /// SMB shares of a virtual server whose name starts with `prefix`.
    pub async fn list_shares(&self, virtual_server_id: &str, prefix: &str) -> Vec<Share> {
        let path = format!("/virtual-servers/{}/cifs", virtual_server_id);
        match self.get_json::<ShareList>(&path).await {
            Ok(list) => list
                .filesystem_shares
                .into_iter()
                .filter(|share| share.name.as_deref().unwrap_or_default().starts_with(prefix))
                .collect(),
            Err(e) => {
                error!("Failed to get SMB shares for virtual server {}: {}", virtual_server_id, e);
                Vec::new()
            }
        }
    }
}
