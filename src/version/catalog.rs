//! Paginated retrieval of released tags

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::TAGS_PER_PAGE;
use crate::host::error::HostError;
use crate::host::repository::RepositoryHost;
use crate::host::types::{Release, Tag};
use crate::protocol::Version;

/// A tag that carries release metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub tag: String,
    pub commit_sha: Option<String>,
    pub description: Option<String>,
}

impl CatalogEntry {
    /// `None` for plain tags without a release
    pub fn from_tag(tag: Tag) -> Option<Self> {
        let release = tag.release?;
        Some(Self {
            tag: tag.name,
            commit_sha: Some(tag.commit.id),
            description: release.description,
        })
    }

    pub fn from_release(release: Release) -> Self {
        Self {
            commit_sha: release.commit.map(|c| c.id),
            tag: release.tag_name,
            description: release.description,
        }
    }

    pub fn version(&self) -> Version {
        Version::new(&self.tag).with_commit_sha(self.commit_sha.as_deref())
    }
}

/// Two tags tie when the host cannot order them deterministically
fn ties(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Append the leading tags tying with `key`.
///
/// Returns `true` when the page ran out before a non-tie was seen, so the
/// next page may hold more ties.
fn take_ties(tags: impl Iterator<Item = Tag>, key: Option<DateTime<Utc>>, out: &mut Vec<Tag>) -> bool {
    for tag in tags {
        if !ties(tag.commit.committed_date, key) {
            return false;
        }
        out.push(tag);
    }
    true
}

/// Release listing over a [`RepositoryHost`]
pub struct ReleaseCatalog<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    per_page: u32,
}

impl<'a, H: RepositoryHost + ?Sized> ReleaseCatalog<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self {
            host,
            per_page: TAGS_PER_PAGE,
        }
    }

    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Every released tag, in host order
    pub async fn list_all(&self) -> Result<Vec<CatalogEntry>, HostError> {
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let result = self.host.list_releases(page, self.per_page).await?;
            debug!("Fetched {} releases from page {}", result.items.len(), page);
            entries.extend(result.items.into_iter().map(CatalogEntry::from_release));

            match result.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(entries)
    }

    /// Released tags updated no earlier than `marker`.
    ///
    /// Pages are walked most-recently-updated first and the walk stops at
    /// `marker`, keeping any following tags whose update time ties with it
    /// (possibly across a page boundary). If `marker` is never seen the
    /// whole catalog is returned.
    pub async fn list_until(&self, marker: &str) -> Result<Vec<CatalogEntry>, HostError> {
        let mut tags = Vec::new();
        let mut boundary: Option<Option<DateTime<Utc>>> = None;
        let mut page = 1;

        loop {
            let result = self.host.list_tags(page, self.per_page).await?;
            let mut items = result.items.into_iter();

            let continue_walk = match boundary {
                Some(key) => take_ties(items, key, &mut tags),
                None => {
                    let mut more = true;
                    while let Some(tag) = items.next() {
                        let found = tag.name == marker;
                        let key = tag.commit.committed_date;
                        tags.push(tag);
                        if found {
                            debug!("Found marker {} on page {}", marker, page);
                            boundary = Some(key);
                            more = take_ties(&mut items, key, &mut tags);
                            break;
                        }
                    }
                    more
                }
            };

            if !continue_walk {
                break;
            }
            match result.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        if boundary.is_none() {
            debug!("Marker {} not found, returning full catalog", marker);
        }

        Ok(tags.into_iter().filter_map(CatalogEntry::from_tag).collect())
    }
}
