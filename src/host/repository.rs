//! Repository host trait used by the check, in and out engines

use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::host::error::HostError;
use crate::host::types::{AssetLink, NewRelease, Page, Release, ReleaseUpdate, Tag, UploadedFile};

/// Operations the engines need from the hosted Git platform
///
/// Lookups by name report a missing object as [`HostError::NotFound`], and
/// creating a release that already exists reports [`HostError::Conflict`].
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Fetches one page of tags, most recently updated first
    async fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<Tag>, HostError>;

    /// Fetches one page of releases, most recently released first
    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Page<Release>, HostError>;

    async fn get_tag(&self, name: &str) -> Result<Tag, HostError>;

    async fn get_release(&self, tag_name: &str) -> Result<Release, HostError>;

    /// Creates `name` pointing at `commit_ref` (a SHA, branch or tag)
    async fn create_tag(&self, name: &str, commit_ref: &str) -> Result<Tag, HostError>;

    async fn create_release(&self, release: &NewRelease) -> Result<Release, HostError>;

    async fn update_release(
        &self,
        tag_name: &str,
        update: &ReleaseUpdate,
    ) -> Result<Release, HostError>;

    async fn list_release_links(&self, tag_name: &str) -> Result<Vec<AssetLink>, HostError>;

    async fn create_release_link(
        &self,
        tag_name: &str,
        name: &str,
        url: &str,
    ) -> Result<AssetLink, HostError>;

    async fn delete_release_link(&self, tag_name: &str, link_id: u64) -> Result<(), HostError>;

    /// Stores a local file on the host and returns its stable URL
    async fn upload_file(&self, path: &Path) -> Result<UploadedFile, HostError>;

    /// Downloads `url` into `destination`
    async fn download_file(&self, url: &str, destination: &Path) -> Result<(), HostError>;
}
