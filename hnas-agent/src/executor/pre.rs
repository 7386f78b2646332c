//! Pre-backup hook: snapshot each configured filesystem, optionally expose
//! the snapshot over SMB, and record everything in the manifest.

use crate::config::PreConfig;
use crate::hnas::HnasClient;
use crate::manifest::{Manifest, ManifestEntry, ShareRecord};
use crate::naming::{snapshot_name, ShareNamer};
use crate::resolve::{resolve_filesystem, virtual_server_of, ResolvedFilesystem};
use crate::utils::Result;
use tracing::{error, info, warn};

/// Outcome of a pre-backup run.
#[derive(Debug)]
pub struct PreBackupReport {
    /// The manifest as written to disk
    pub manifest: Manifest,
    /// Number of filesystem references processed
    pub requested: usize,
}

impl PreBackupReport {
    pub fn snapshots_created(&self) -> usize {
        self.manifest.snapshots.len()
    }

    pub fn shares_created(&self) -> usize {
        self.manifest
            .snapshots
            .iter()
            .filter(|entry| entry.share.is_some())
            .count()
    }

    /// The run failed as a whole only when no snapshot at all was created.
    pub fn is_failure(&self) -> bool {
        self.snapshots_created() == 0
    }
}

/// Run the pre-backup hook. `run_timestamp` (`YYYYMMDD_HHMMSS`) is embedded
/// in every snapshot name of this run.
///
/// Per-filesystem failures are logged and skipped. The only error returned
/// is failing to write the manifest.
pub async fn run_pre_backup(
    client: &HnasClient,
    config: &PreConfig,
    run_timestamp: &str,
) -> Result<PreBackupReport> {
    let common = &config.common;
    let mut manifest = Manifest::new(run_timestamp, &common.host, common.search_tag.clone());
    let mut share_names = ShareNamer::new(common.share_prefix.as_str());

    for reference in &config.filesystems {
        info!("Processing filesystem input: {}", reference);

        let Some(fs) = resolve_filesystem(client, reference).await else {
            continue;
        };

        let entry = snapshot_filesystem(client, config, &fs, run_timestamp, &mut share_names).await;
        if let Some(entry) = entry {
            manifest.snapshots.push(entry);
        }
    }

    manifest.save(&common.manifest_path)?;
    info!(
        "Pre-backup script completed. Created {} snapshots; manifest written to {}",
        manifest.snapshots.len(),
        common.manifest_path.display()
    );

    Ok(PreBackupReport {
        manifest,
        requested: config.filesystems.len(),
    })
}

async fn snapshot_filesystem(
    client: &HnasClient,
    config: &PreConfig,
    fs: &ResolvedFilesystem,
    run_timestamp: &str,
    share_names: &mut ShareNamer,
) -> Option<ManifestEntry> {
    let tag = config.common.search_tag.as_deref();
    let name = snapshot_name(tag, &fs.label, run_timestamp);

    info!("Creating snapshot for filesystem '{}' (ID: {})", fs.label, fs.id);

    let Some(snapshot) = client
        .create_snapshot(&fs.id, &name, tag, config.retention_interval)
        .await
    else {
        error!("Failed to create snapshot for filesystem: {} ({})", fs.label, fs.id);
        return None;
    };

    if snapshot.object_id.is_none() {
        warn!("Snapshot '{}' was created but the array returned no object ID", name);
    }

    let share = if config.create_smb_share {
        share_snapshot(client, fs, &name, share_names).await
    } else {
        None
    };

    Some(ManifestEntry {
        filesystem_id: fs.id.clone(),
        filesystem_label: fs.label.clone(),
        snapshot_name: name,
        snapshot_id: snapshot.object_id,
        creation_time: snapshot.creation_time,
        search_tag: config.common.search_tag.clone(),
        share,
    })
}

/// Create the SMB share for a fresh snapshot. A failure here never
/// invalidates the snapshot itself.
async fn share_snapshot(
    client: &HnasClient,
    fs: &ResolvedFilesystem,
    snapshot_name: &str,
    share_names: &mut ShareNamer,
) -> Option<ShareRecord> {
    info!("Creating SMB share for snapshot access...");

    let Some(virtual_server_id) = virtual_server_of(client, fs).await else {
        warn!(
            "Cannot determine virtual server for filesystem {}; snapshot kept without a share",
            fs.id
        );
        return None;
    };

    let name = share_names.next(chrono::Local::now());
    let Some(share) = client
        .create_share(&fs.id, &virtual_server_id, &name, snapshot_name)
        .await
    else {
        warn!("Failed to create SMB share for snapshot, but snapshot was created successfully");
        return None;
    };

    let record = ShareRecord {
        name: share.name.unwrap_or(name),
        id: share.object_id,
        path: share.path,
    };
    info!(
        "SMB share created: {} -> {}",
        record.name,
        record.path.as_deref().unwrap_or("")
    );
    Some(record)
}
