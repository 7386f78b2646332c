//! Resolution of configured filesystem references to array objects.

use crate::hnas::HnasClient;
use crate::naming::is_filesystem_id;
use tracing::warn;

/// A filesystem reference resolved against the array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilesystem {
    pub id: String,
    pub label: String,
    /// Owning EVS, when the lookup reported it
    pub virtual_server_id: Option<String>,
}

/// Resolve an object ID or label. IDs are looked up directly; labels go
/// through a scan of the filesystem list, first match wins. Returns `None`
/// (after logging) when the reference can't be resolved.
pub async fn resolve_filesystem(client: &HnasClient, reference: &str) -> Option<ResolvedFilesystem> {
    if is_filesystem_id(reference) {
        let Some(fs) = client.get_filesystem(reference).await else {
            warn!("Could not retrieve info for filesystem ID: {}", reference);
            return None;
        };
        return Some(ResolvedFilesystem {
            id: reference.to_string(),
            label: fs.label.unwrap_or_else(|| reference.to_string()),
            virtual_server_id: fs.virtual_server_id,
        });
    }

    let Some(fs) = client.find_filesystem_by_label(reference).await else {
        warn!("Could not find filesystem with name: {}", reference);
        return None;
    };
    let Some(id) = fs.filesystem_id.filter(|id| !id.is_empty()) else {
        warn!("Found filesystem '{}' but no ID available", reference);
        return None;
    };

    Some(ResolvedFilesystem {
        id,
        label: fs.label.unwrap_or_else(|| reference.to_string()),
        virtual_server_id: fs.virtual_server_id,
    })
}

/// Owning virtual server of a filesystem, using the already known value
/// when there is one.
pub async fn virtual_server_of(client: &HnasClient, fs: &ResolvedFilesystem) -> Option<String> {
    if let Some(vs) = &fs.virtual_server_id {
        return Some(vs.clone());
    }
    client
        .get_filesystem(&fs.id)
        .await
        .and_then(|detail| detail.virtual_server_id)
}
