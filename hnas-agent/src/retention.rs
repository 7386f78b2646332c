//! Age-based cleanup of snapshots and shares.
//!
//! Only objects strictly older than the cutoff are removed. Anything whose
//! age can't be determined is logged and kept.

use crate::hnas::{HnasClient, Share, Snapshot};
use crate::naming::parse_share_timestamp;
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use serde_json::Value;
use tracing::{info, warn};

/// Moment before which objects are considered expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff(DateTime<Local>);

impl Cutoff {
    pub fn new(now: DateTime<Local>, retention_days: u32) -> Self {
        Cutoff(now - Duration::days(i64::from(retention_days)))
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Wall-clock form, comparable with share-name timestamps.
    pub fn local(&self) -> NaiveDateTime {
        self.0.naive_local()
    }
}

/// Normalize a snapshot `creationTime` (integer epoch or numeric string) to
/// epoch seconds.
pub fn creation_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn snapshot_label(snapshot: &Snapshot) -> &str {
    snapshot
        .display_name
        .as_deref()
        .or(snapshot.object_id.as_deref())
        .unwrap_or("unknown")
}

/// Snapshots created strictly before the cutoff.
pub fn expired_snapshots<'a>(snapshots: &'a [Snapshot], cutoff: &Cutoff) -> Vec<&'a Snapshot> {
    snapshots
        .iter()
        .filter(|snapshot| match snapshot.creation_time.as_ref().and_then(creation_epoch) {
            Some(created) => created < cutoff.epoch_secs(),
            None => {
                warn!(
                    "Invalid creation time format for snapshot: {}",
                    snapshot_label(snapshot)
                );
                false
            }
        })
        .collect()
}

/// Shares whose name timestamp is strictly before the cutoff.
pub fn expired_shares<'a>(shares: &'a [Share], cutoff: &Cutoff) -> Vec<&'a Share> {
    shares
        .iter()
        .filter(|share| {
            let name = share.name.as_deref().unwrap_or_default();
            match parse_share_timestamp(name) {
                Some(created) => created < cutoff.local(),
                None => {
                    warn!("Skipping SMB share with unexpected name format: {}", name);
                    false
                }
            }
        })
        .collect()
}

/// Delete expired snapshots of one filesystem carrying `search_tag`.
/// Returns how many were removed.
pub async fn sweep_snapshots(
    client: &HnasClient,
    filesystem_id: &str,
    search_tag: &str,
    cutoff: &Cutoff,
) -> usize {
    let snapshots = client.list_snapshots(filesystem_id, Some(search_tag)).await;
    let mut deleted = 0;

    for snapshot in expired_snapshots(&snapshots, cutoff) {
        let Some(object_id) = snapshot.object_id.as_deref() else {
            warn!("Expired snapshot {} has no object ID", snapshot_label(snapshot));
            continue;
        };
        if client.delete_snapshot(object_id).await.is_success() {
            deleted += 1;
        }
    }

    if deleted > 0 {
        info!("Cleaned up {} old snapshots from filesystem '{}'", deleted, filesystem_id);
    }
    deleted
}

/// Delete expired prefix-matching shares of one virtual server.
pub async fn sweep_shares(
    client: &HnasClient,
    virtual_server_id: &str,
    prefix: &str,
    cutoff: &Cutoff,
) -> usize {
    let shares = client.list_shares(virtual_server_id, prefix).await;
    let mut deleted = 0;

    for share in expired_shares(&shares, cutoff) {
        let Some(object_id) = share.object_id.as_deref() else {
            warn!(
                "Expired SMB share {} has no object ID",
                share.name.as_deref().unwrap_or("unknown")
            );
            continue;
        };
        if client.delete_share(object_id).await.is_success() {
            deleted += 1;
        }
    }

    if deleted > 0 {
        info!(
            "Cleaned up {} old SMB shares from virtual server '{}'",
            deleted, virtual_server_id
        );
    }
    deleted
}
