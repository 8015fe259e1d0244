//! Release publishing for the `out` entry point
//!
//! Publishing is a sequence of idempotent steps:
//!
//! 1. resolve local assets (fails before any host call)
//! 2. ensure the tag exists, creating it at the commitish if needed
//! 3. create the release, or update its name and description
//! 4. replace the release links: list, delete all, then upload and link each asset
//!
//! Step 4 can be re-run from scratch whether the previous run stopped
//! before or after clearing the old links.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::MAX_UPLOAD_ATTEMPTS;
use crate::error::ResourceError;
use crate::host::error::HostError;
use crate::host::repository::RepositoryHost;
use crate::host::types::{AssetLink, NewRelease, Release, ReleaseUpdate, Tag};
use crate::protocol::{OutParams, OutResponse, Version};
use crate::release::assets::{asset_name, resolve_assets};
use crate::release::metadata::release_metadata;

/// Inputs of a publish, read from the build output directory
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    pub tag: String,
    pub commitish: Option<String>,
    pub name: Option<String>,
    pub body: Option<String>,
    pub source_dir: PathBuf,
    pub globs: Vec<String>,
}

impl SyncRequest {
    /// Read the files referenced by `params` from `source_dir`
    pub async fn load(source_dir: &Path, params: &OutParams) -> Result<Self, ResourceError> {
        if params.tag.is_empty() {
            return Err(ResourceError::Configuration(
                "params.tag is required".to_string(),
            ));
        }
        let tag = read_param_file(source_dir, &params.tag).await?;
        if tag.is_empty() {
            return Err(ResourceError::Configuration(format!(
                "tag file {:?} is empty",
                params.tag
            )));
        }

        let commitish = match &params.commitish {
            Some(path) => Some(read_param_file(source_dir, path).await?).filter(|c| !c.is_empty()),
            None => None,
        };
        let name = match &params.name {
            Some(path) => Some(read_param_file(source_dir, path).await?).filter(|n| !n.is_empty()),
            None => None,
        };
        let body = match &params.body {
            Some(path) => Some(read_param_file(source_dir, path).await?),
            None => None,
        };

        Ok(Self {
            tag: format!("{}{}", params.tag_prefix, tag),
            commitish,
            name,
            body,
            source_dir: source_dir.to_path_buf(),
            globs: params.globs.clone(),
        })
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.tag)
    }
}

async fn read_param_file(source_dir: &Path, relative: &str) -> Result<String, ResourceError> {
    let path = source_dir.join(relative);
    let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
        ResourceError::Configuration(format!("cannot read {:?}: {}", path, e))
    })?;
    Ok(contents.trim().to_string())
}

/// Steps of the link replacement
#[derive(Debug)]
enum LinkReplacement {
    Listing,
    Clearing(Vec<AssetLink>),
    Publishing(usize),
    Done,
}

pub struct SyncEngine<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    max_attempts: u32,
}

impl<'a, H: RepositoryHost + ?Sized> SyncEngine<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self {
            host,
            max_attempts: MAX_UPLOAD_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn sync(&self, request: &SyncRequest) -> Result<OutResponse, ResourceError> {
        let assets = resolve_assets(&request.source_dir, &request.globs)?;

        let tag = self.resolve_tag(request).await?;
        let release = self.resolve_release(request).await?;
        let links = self.replace_links(&request.tag, &assets).await?;
        info!(
            "Published {} with {} asset link(s)",
            request.tag,
            links.len()
        );

        Ok(OutResponse {
            version: Version::new(&request.tag),
            metadata: release_metadata(&release, Some(&tag.commit.id)),
        })
    }

    async fn resolve_tag(&self, request: &SyncRequest) -> Result<Tag, ResourceError> {
        match self.host.get_tag(&request.tag).await {
            Ok(tag) => {
                debug!("Tag {} already exists", request.tag);
                Ok(tag)
            }
            Err(HostError::NotFound(_)) => {
                let Some(commitish) = &request.commitish else {
                    return Err(ResourceError::MissingCommitish(request.tag.clone()));
                };
                info!("Creating tag {} at {}", request.tag, commitish);
                match self.host.create_tag(&request.tag, commitish).await {
                    Ok(tag) => Ok(tag),
                    // created concurrently by another run
                    Err(HostError::Conflict(_)) => Ok(self.host.get_tag(&request.tag).await?),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_release(&self, request: &SyncRequest) -> Result<Release, ResourceError> {
        match self.host.get_release(&request.tag).await {
            Ok(_) => self.update_release(request).await,
            Err(HostError::NotFound(_)) => {
                info!("Creating release {}", request.tag);
                let new_release = NewRelease {
                    name: request.display_name().to_string(),
                    tag_name: request.tag.clone(),
                    description: request.body.clone(),
                };
                match self.host.create_release(&new_release).await {
                    Ok(release) => Ok(release),
                    Err(HostError::Conflict(_)) => {
                        debug!("Release {} already exists, updating", request.tag);
                        self.update_release(request).await
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_release(&self, request: &SyncRequest) -> Result<Release, ResourceError> {
        info!("Updating release {}", request.tag);
        let update = ReleaseUpdate {
            name: request.display_name().to_string(),
            description: request.body.clone(),
        };
        Ok(self.host.update_release(&request.tag, &update).await?)
    }

    /// Make the release links exactly one per asset
    async fn replace_links(
        &self,
        tag: &str,
        assets: &[PathBuf],
    ) -> Result<Vec<AssetLink>, ResourceError> {
        let mut published = Vec::with_capacity(assets.len());
        let mut step = LinkReplacement::Listing;

        loop {
            step = match step {
                LinkReplacement::Listing => {
                    LinkReplacement::Clearing(self.host.list_release_links(tag).await?)
                }
                LinkReplacement::Clearing(links) => {
                    for link in links {
                        debug!("Deleting link {} ({})", link.name, link.id);
                        self.host.delete_release_link(tag, link.id).await?;
                    }
                    LinkReplacement::Publishing(0)
                }
                LinkReplacement::Publishing(index) => match assets.get(index) {
                    Some(path) => {
                        let link = self.publish_with_retry(tag, path, &published).await?;
                        published.push(link);
                        LinkReplacement::Publishing(index + 1)
                    }
                    None => LinkReplacement::Done,
                },
                LinkReplacement::Done => return Ok(published),
            };
        }
    }

    async fn publish_with_retry(
        &self,
        tag: &str,
        path: &Path,
        published: &[AssetLink],
    ) -> Result<AssetLink, ResourceError> {
        let name = asset_name(path)?;
        let mut attempt = 1;

        loop {
            match self.publish(tag, path, &name).await {
                Ok(link) => return Ok(link),
                Err(e) if !e.is_transient() => return Err(e.into()),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(ResourceError::UploadRetriesExhausted {
                        file: name,
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "Uploading {} failed (attempt {}/{}): {}",
                        name, attempt, self.max_attempts, e
                    );
                    self.discard_partial(tag, &name, published).await?;
                    attempt += 1;
                }
            }
        }
    }

    async fn publish(&self, tag: &str, path: &Path, name: &str) -> Result<AssetLink, HostError> {
        let uploaded = self.host.upload_file(path).await?;
        debug!("Uploaded {} to {}", name, uploaded.url);
        self.host.create_release_link(tag, name, &uploaded.url).await
    }

    /// Delete links a failed attempt may have left behind for `name`
    async fn discard_partial(
        &self,
        tag: &str,
        name: &str,
        published: &[AssetLink],
    ) -> Result<(), ResourceError> {
        let stale = self
            .host
            .list_release_links(tag)
            .await?
            .into_iter()
            .filter(|link| link.name == name && !published.iter().any(|p| p.id == link.id));

        for link in stale {
            debug!("Deleting partial link {} ({})", link.name, link.id);
            self.host.delete_release_link(tag, link.id).await?;
        }
        Ok(())
    }
}
