//! Post-backup hook: tear down this run's shares and snapshots according to
//! the job outcome, then sweep anything older than the retention window.

use crate::config::PostConfig;
use crate::hnas::HnasClient;
use crate::manifest::{Manifest, ManifestEntry};
use crate::resolve::{resolve_filesystem, virtual_server_of};
use crate::retention::{sweep_shares, sweep_snapshots, Cutoff};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use tracing::{error, info, warn};

/// Result reported by the backup tool for the finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Success,
    Warning,
    Failed,
    Unknown(String),
}

impl JobResult {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("success") {
            JobResult::Success
        } else if raw.eq_ignore_ascii_case("warning") {
            JobResult::Warning
        } else if raw.eq_ignore_ascii_case("failed") {
            JobResult::Failed
        } else {
            JobResult::Unknown(raw.to_string())
        }
    }

    /// The job result wins; the session result is used when the job result
    /// wasn't provided.
    pub fn from_indicators(job: Option<&str>, session: Option<&str>) -> Self {
        let present = |v: &&str| !v.trim().is_empty();
        job.filter(present)
            .or(session.filter(present))
            .map(Self::parse)
            .unwrap_or_else(|| JobResult::Unknown("Unknown".into()))
    }

    /// Warnings count as success; anything unrecognised as failure.
    pub fn succeeded(&self) -> bool {
        matches!(self, JobResult::Success | JobResult::Warning)
    }
}

impl std::fmt::Display for JobResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobResult::Success => f.write_str("Success"),
            JobResult::Warning => f.write_str("Warning"),
            JobResult::Failed => f.write_str("Failed"),
            JobResult::Unknown(raw) => f.write_str(raw),
        }
    }
}

pub fn should_cleanup(succeeded: bool, cleanup_on_success: bool, cleanup_on_failure: bool) -> bool {
    (succeeded && cleanup_on_success) || (!succeeded && cleanup_on_failure)
}

/// Outcome of a post-backup run.
#[derive(Debug, Default)]
pub struct PostBackupReport {
    pub cleanup_performed: bool,
    /// Entries loaded from the manifest
    pub manifest_entries: usize,
    /// Manifest snapshots deleted (or already gone)
    pub snapshots_deleted: usize,
    /// Manifest shares deleted (or already gone)
    pub shares_deleted: usize,
    /// Manifest shares whose delete failed
    pub share_delete_failures: usize,
    pub swept_snapshots: usize,
    pub swept_shares: usize,
    pub manifest_removed: bool,
}

/// Filesystems and virtual servers visited by the retention sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepTargets {
    pub filesystems: BTreeSet<String>,
    pub virtual_servers: BTreeSet<String>,
}

/// Run the post-backup hook at `now`. Never fails: every problem is logged
/// and the affected unit skipped.
pub async fn run_post_backup(
    client: &HnasClient,
    config: &PostConfig,
    now: DateTime<Local>,
) -> PostBackupReport {
    let common = &config.common;
    let outcome = JobResult::from_indicators(
        config.job_result.as_deref(),
        config.session_result.as_deref(),
    );
    info!("Backup job result: {}", outcome);

    let entries = load_entries(&common.manifest_path);
    let cleanup = should_cleanup(
        outcome.succeeded(),
        config.cleanup_on_success,
        config.cleanup_on_failure,
    );

    let mut report = PostBackupReport {
        cleanup_performed: cleanup,
        manifest_entries: entries.len(),
        ..Default::default()
    };

    if cleanup && !entries.is_empty() {
        info!("Cleaning up snapshots and SMB shares created during this backup session...");
        delete_entries(client, &entries, &mut report).await;
    } else if !cleanup {
        info!("Retaining this session's snapshots (job result {})", outcome);
    }

    if config.retention_days > 0 {
        info!(
            "Performing retention-based cleanup (keeping snapshots newer than {} days)...",
            config.retention_days
        );
        let cutoff = Cutoff::new(now, config.retention_days);
        let targets = sweep_targets(client, &entries, &config.fallback_filesystems).await;

        match common.search_tag.as_deref() {
            Some(tag) => {
                for filesystem_id in &targets.filesystems {
                    report.swept_snapshots +=
                        sweep_snapshots(client, filesystem_id, tag, &cutoff).await;
                }
            }
            None => warn!("No search tag configured; skipping snapshot retention sweep"),
        }
        for virtual_server_id in &targets.virtual_servers {
            report.swept_shares +=
                sweep_shares(client, virtual_server_id, &common.share_prefix, &cutoff).await;
        }
    }

    if cleanup && common.manifest_path.exists() {
        match std::fs::remove_file(&common.manifest_path) {
            Ok(()) => {
                info!("Cleaned up snapshot information file");
                report.manifest_removed = true;
            }
            Err(e) => warn!("Failed to clean up snapshot info file: {}", e),
        }
    }

    info!(
        "Post-backup script completed. Processed {} snapshots from this session.",
        report.manifest_entries
    );
    report
}

fn load_entries(path: &std::path::Path) -> Vec<ManifestEntry> {
    match Manifest::load(path) {
        Ok(Some(manifest)) => {
            info!(
                "Loaded information for {} snapshots from pre-backup script",
                manifest.snapshots.len()
            );
            manifest.snapshots
        }
        Ok(None) => {
            warn!("Snapshot info file not found: {}", path.display());
            Vec::new()
        }
        Err(e) => {
            error!("Failed to load snapshot information from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Delete each entry's share, then its snapshot, tallying the results.
async fn delete_entries(client: &HnasClient, entries: &[ManifestEntry], report: &mut PostBackupReport) {
    for entry in entries {
        if let Some(share) = &entry.share {
            match share.id.as_deref() {
                Some(id) => {
                    info!("Deleting SMB share: {}", share.name);
                    if client.delete_share(id).await.is_success() {
                        report.shares_deleted += 1;
                    } else {
                        report.share_delete_failures += 1;
                    }
                }
                None => warn!("SMB share {} has no object ID recorded; skipping", share.name),
            }
        }

        match entry.snapshot_id.as_deref() {
            Some(id) => {
                if client.delete_snapshot(id).await.is_success() {
                    report.snapshots_deleted += 1;
                }
            }
            None => warn!(
                "Snapshot {} has no object ID recorded; skipping",
                entry.snapshot_name
            ),
        }
    }
}

/// Manifest entries drive the sweep when there are any; otherwise the
/// fallback references are resolved. The two sources are never combined.
pub async fn sweep_targets(
    client: &HnasClient,
    entries: &[ManifestEntry],
    fallback: &[String],
) -> SweepTargets {
    let mut targets = SweepTargets::default();

    if !entries.is_empty() {
        targets
            .filesystems
            .extend(entries.iter().map(|e| e.filesystem_id.clone()));
        for filesystem_id in &targets.filesystems {
            if let Some(vs) = client
                .get_filesystem(filesystem_id)
                .await
                .and_then(|fs| fs.virtual_server_id)
            {
                targets.virtual_servers.insert(vs);
            }
        }
        return targets;
    }

    for reference in fallback {
        let Some(fs) = resolve_filesystem(client, reference).await else {
            continue;
        };
        if let Some(vs) = virtual_server_of(client, &fs).await {
            targets.virtual_servers.insert(vs);
        }
        targets.filesystems.insert(fs.id);
    }

    targets
}
