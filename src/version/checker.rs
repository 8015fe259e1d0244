//! New-release detection for the `check` entry point

use tracing::{debug, info};

use crate::error::ResourceError;
use crate::host::repository::RepositoryHost;
use crate::protocol::{CheckRequest, Version};
use crate::version::catalog::{CatalogEntry, ReleaseCatalog};
use crate::version::filter::TagFilter;
use crate::version::ordering::VersionToken;

/// Version-bearing entries sorted ascending by version.
///
/// Entries whose tag does not parse under `filter` are dropped, as are
/// repeated tag names.
pub fn sort_entries(
    filter: &TagFilter,
    entries: Vec<CatalogEntry>,
) -> Vec<(VersionToken, CatalogEntry)> {
    let mut versions: Vec<(VersionToken, CatalogEntry)> = entries
        .into_iter()
        .filter_map(|entry| filter.parse(&entry.tag).map(|token| (token, entry)))
        .collect();

    versions.sort_by(|(a, _), (b, _)| a.cmp(b));
    versions.dedup_by(|(_, a), (_, b)| a.tag == b.tag);
    versions
}

/// Versions to emit for a sorted catalog and optional checkpoint, oldest first
///
/// - no versions: nothing
/// - no checkpoint: the newest version only
/// - checkpoint is the newest: the newest version only
/// - checkpoint present: the checkpoint and every later version
/// - checkpoint absent but version-bearing: every version at or above it,
///   or the newest when none are
/// - checkpoint not version-bearing: the newest version only
pub fn select_new_versions(
    filter: &TagFilter,
    sorted: &[(VersionToken, CatalogEntry)],
    checkpoint: Option<&Version>,
) -> Vec<Version> {
    let Some((_, newest)) = sorted.last() else {
        return Vec::new();
    };

    let Some(checkpoint) = checkpoint else {
        return vec![newest.version()];
    };

    if newest.tag == checkpoint.tag {
        return vec![newest.version()];
    }

    if let Some(pos) = sorted.iter().position(|(_, e)| e.tag == checkpoint.tag) {
        return sorted[pos..].iter().map(|(_, e)| e.version()).collect();
    }

    if let Some(target) = filter.parse(&checkpoint.tag) {
        let newer: Vec<Version> = sorted
            .iter()
            .filter(|(token, _)| *token >= target)
            .map(|(_, e)| e.version())
            .collect();
        if !newer.is_empty() {
            return newer;
        }
    }

    info!(
        "Checkpoint {} not found, restarting from {}",
        checkpoint.tag, newest.tag
    );
    vec![newest.version()]
}

/// Run a check against `host`
pub async fn check<H: RepositoryHost + ?Sized>(
    host: &H,
    request: &CheckRequest,
) -> Result<Vec<Version>, ResourceError> {
    let filter = TagFilter::new(request.source.tag_filter())?;
    let checkpoint = request.checkpoint();
    let catalog = ReleaseCatalog::new(host);

    let entries = match checkpoint {
        Some(version) => catalog.list_until(&version.tag).await?,
        None => catalog.list_all().await?,
    };
    debug!("Fetched {} released tags", entries.len());

    let sorted = sort_entries(&filter, entries);
    let versions = select_new_versions(&filter, &sorted, checkpoint);
    info!("Found {} version(s)", versions.len());

    Ok(versions)
}
