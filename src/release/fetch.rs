//! Release retrieval for the `in` entry point

use std::path::Path;

use glob::Pattern;
use tracing::{debug, info};

use crate::error::ResourceError;
use crate::host::error::HostError;
use crate::host::repository::RepositoryHost;
use crate::host::types::{AssetLink, Release, SourceArchive};
use crate::protocol::{InRequest, InResponse, Version};
use crate::release::metadata::release_metadata;
use crate::version::filter::TagFilter;

/// Write the release named by `request.version` into `destination`.
///
/// Produces the `tag`, `version`, `commit_sha` (when known) and `body`
/// files, followed by the selected asset links and source archives.
pub async fn fetch<H: RepositoryHost + ?Sized>(
    host: &H,
    request: &InRequest,
    destination: &Path,
) -> Result<InResponse, ResourceError> {
    let filter = TagFilter::new(request.source.tag_filter())?;
    let patterns = compile_globs(&request.params.globs)?;
    let tag = &request.version.tag;
    if tag.trim().is_empty() {
        return Err(ResourceError::Configuration(
            "version.tag is required".to_string(),
        ));
    }

    tokio::fs::create_dir_all(destination).await?;

    let release = match host.get_release(tag).await {
        Ok(release) => release,
        Err(HostError::NotFound(_)) => return Err(ResourceError::ReleaseNotFound(tag.clone())),
        Err(e) => return Err(e.into()),
    };
    let commit_sha = release
        .commit_sha()
        .or(request.version.commit_sha.as_deref())
        .map(str::to_string);

    write_file(destination, "tag", tag).await?;
    write_file(destination, "version", filter.capture(tag).unwrap_or_default()).await?;
    if let Some(sha) = &commit_sha {
        write_file(destination, "commit_sha", sha).await?;
    }
    write_file(
        destination,
        "body",
        release.description.as_deref().unwrap_or_default(),
    )
    .await?;

    for link in selected_links(&release, &patterns) {
        let file_name = local_name(&link.name)?;
        info!("Downloading {}", file_name);
        host.download_file(&link.url, &destination.join(file_name)).await?;
    }

    let formats = request.params.source_formats();
    for source in selected_sources(&release, &formats) {
        let Some(file_name) = archive_name(source) else {
            debug!("Skipping source archive without file name: {}", source.url);
            continue;
        };
        info!("Downloading source archive {}", file_name);
        host.download_file(&source.url, &destination.join(file_name)).await?;
    }

    Ok(InResponse {
        version: Version::new(tag).with_commit_sha(commit_sha.as_deref()),
        metadata: release_metadata(&release, commit_sha.as_deref()),
    })
}

fn compile_globs(globs: &[String]) -> Result<Vec<Pattern>, ResourceError> {
    globs
        .iter()
        .map(|g| {
            Pattern::new(g)
                .map_err(|e| ResourceError::Configuration(format!("invalid glob {:?}: {}", g, e)))
        })
        .collect()
}

/// Links whose name matches any pattern; every link when there are none
fn selected_links<'r>(release: &'r Release, patterns: &[Pattern]) -> Vec<&'r AssetLink> {
    release
        .assets
        .links
        .iter()
        .filter(|link| patterns.is_empty() || patterns.iter().any(|p| p.matches(&link.name)))
        .collect()
}

fn selected_sources<'r>(release: &'r Release, formats: &[String]) -> Vec<&'r SourceArchive> {
    release
        .assets
        .sources
        .iter()
        .filter(|source| formats.iter().any(|f| *f == source.format))
        .collect()
}

/// Link name as a file name inside the destination directory.
///
/// Names carrying directory components (`../x`, `/tmp/x`, `a/b`) are rejected.
fn local_name(name: &str) -> Result<&str, ResourceError> {
    match Path::new(name).file_name().and_then(|n| n.to_str()) {
        Some(file_name) if file_name == name => Ok(file_name),
        _ => Err(ResourceError::Configuration(format!(
            "release link name {:?} is not a plain file name",
            name
        ))),
    }
}

/// Last path segment of the archive URL
fn archive_name(source: &SourceArchive) -> Option<&str> {
    source
        .url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
}

async fn write_file(dir: &Path, name: &str, contents: &str) -> Result<(), ResourceError> {
    tokio::fs::write(dir.join(name), contents).await?;
    Ok(())
}
