use crate::host::types::Release;
use crate::protocol::MetadataPair;

/// Display rows for a release: name, tag, commit (when known), body (when non-empty)
pub fn release_metadata(release: &Release, commit_sha: Option<&str>) -> Vec<MetadataPair> {
    let name = release.name.as_deref().unwrap_or(&release.tag_name);
    let mut metadata = vec![
        MetadataPair::new("name", name),
        MetadataPair::new("tag", &release.tag_name),
    ];

    if let Some(sha) = commit_sha.or(release.commit_sha()).filter(|s| !s.is_empty()) {
        metadata.push(MetadataPair::new("commit_sha", sha));
    }

    if let Some(body) = release.description.as_deref().filter(|b| !b.is_empty()) {
        metadata.push(MetadataPair::markdown("body", body));
    }

    metadata
}
