//! In-memory repository host

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use gitlab_release_resource::host::HostError;
use gitlab_release_resource::host::repository::RepositoryHost;
use gitlab_release_resource::host::types::{
    AssetLink, Commit, NewRelease, Page, Release, ReleaseNote, ReleaseUpdate, SourceArchive, Tag,
    UploadedFile,
};

const WEB_URL: &str = "https://gitlab.example.com/group/project";

/// Host operation recorded by [`FakeHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTags { page: u32 },
    ListReleases { page: u32 },
    GetTag(String),
    GetRelease(String),
    CreateTag { name: String, commit_ref: String },
    CreateRelease(String),
    UpdateRelease { tag: String, description: Option<String> },
    ListLinks(String),
    CreateLink { tag: String, name: String },
    DeleteLink { tag: String, id: u64 },
    Upload(String),
    Download(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateTag { .. }
                | Call::CreateRelease(_)
                | Call::UpdateRelease { .. }
                | Call::CreateLink { .. }
                | Call::DeleteLink { .. }
                | Call::Upload(_)
        )
    }
}

#[derive(Default)]
struct State {
    tags: Vec<Tag>,
    releases: Vec<Release>,
    files: HashMap<String, Vec<u8>>,
    next_id: u64,
    upload_failures: HashMap<String, u32>,
    lost_link_responses: HashMap<String, u32>,
    calls: Vec<Call>,
}

/// Repository host backed by in-memory tags, releases and files.
///
/// Tags are listed most recently committed first, releases most recently
/// added first.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<State>,
}

/// Commit date `minutes` after the start of 2024
pub fn at(minutes: i64) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes))
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Tag without release metadata
    pub fn with_tag(self, name: &str, committed: Option<DateTime<Utc>>) -> Self {
        self.state().tags.push(Tag {
            name: name.to_string(),
            commit: Commit {
                id: format!("sha-{}", name),
                committed_date: committed,
            },
            release: None,
        });
        self
    }

    /// Tag with a release
    pub fn with_release(self, name: &str, committed: Option<DateTime<Utc>>) -> Self {
        {
            let mut state = self.state();
            let commit = Commit {
                id: format!("sha-{}", name),
                committed_date: committed,
            };
            state.tags.push(Tag {
                name: name.to_string(),
                commit: commit.clone(),
                release: Some(ReleaseNote {
                    tag_name: name.to_string(),
                    description: None,
                }),
            });
            state.releases.push(Release {
                name: Some(name.to_string()),
                tag_name: name.to_string(),
                description: None,
                commit: Some(commit),
                assets: Default::default(),
            });
        }
        self
    }

    pub fn with_description(self, tag: &str, description: &str) -> Self {
        if let Some(release) = self.state().releases.iter_mut().find(|r| r.tag_name == tag) {
            release.description = Some(description.to_string());
        }
        self
    }

    /// Attach a stored file to the release as a link
    pub fn with_link(self, tag: &str, name: &str, contents: &str) -> Self {
        {
            let mut state = self.state();
            state.next_id += 1;
            let id = state.next_id;
            let url = format!("{}/uploads/{}/{}", WEB_URL, id, name);
            state.files.insert(url.clone(), contents.as_bytes().to_vec());
            if let Some(release) = state.releases.iter_mut().find(|r| r.tag_name == tag) {
                release.assets.links.push(AssetLink {
                    id,
                    name: name.to_string(),
                    url,
                });
            }
        }
        self
    }

    /// Attach a host-generated source archive to the release
    pub fn with_source(self, tag: &str, format: &str, contents: &str) -> Self {
        {
            let mut state = self.state();
            let url = format!("{}/-/archive/{}/project-{}.{}", WEB_URL, tag, tag, format);
            state.files.insert(url.clone(), contents.as_bytes().to_vec());
            if let Some(release) = state.releases.iter_mut().find(|r| r.tag_name == tag) {
                release.assets.sources.push(SourceArchive {
                    format: format.to_string(),
                    url,
                });
            }
        }
        self
    }

    /// Fail the next `times` uploads of `file` with a 503
    pub fn fail_uploads(self, file: &str, times: u32) -> Self {
        self.state().upload_failures.insert(file.to_string(), times);
        self
    }

    /// Store the next `times` links named `file` but answer with a 502
    pub fn lose_link_responses(self, file: &str, times: u32) -> Self {
        self.state()
            .lost_link_responses
            .insert(file.to_string(), times);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn release(&self, tag: &str) -> Option<Release> {
        self.state()
            .releases
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned()
    }

    pub fn tag(&self, name: &str) -> Option<Tag> {
        self.state().tags.iter().find(|t| t.name == name).cloned()
    }

    pub fn link_names(&self, tag: &str) -> Vec<String> {
        self.release(tag)
            .map(|r| r.assets.links.into_iter().map(|l| l.name).collect())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) -> MutexGuard<'_, State> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> Page<T> {
    let per_page = per_page.max(1) as usize;
    let start = (page.max(1) as usize - 1) * per_page;
    let end = (start + per_page).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();
    let next_page = (end < items.len()).then_some(page + 1);
    Page {
        items: slice,
        next_page,
    }
}

fn release_mut<'s>(state: &'s mut State, tag: &str) -> Result<&'s mut Release, HostError> {
    state
        .releases
        .iter_mut()
        .find(|r| r.tag_name == tag)
        .ok_or_else(|| HostError::NotFound(tag.to_string()))
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<Tag>, HostError> {
        let state = self.record(Call::ListTags { page });
        let mut tags = state.tags.clone();
        tags.sort_by(|a, b| b.commit.committed_date.cmp(&a.commit.committed_date));
        Ok(paginate(&tags, page, per_page))
    }

    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Page<Release>, HostError> {
        let state = self.record(Call::ListReleases { page });
        let releases: Vec<Release> = state.releases.iter().rev().cloned().collect();
        Ok(paginate(&releases, page, per_page))
    }

    async fn get_tag(&self, name: &str) -> Result<Tag, HostError> {
        let state = self.record(Call::GetTag(name.to_string()));
        state
            .tags
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| HostError::NotFound(name.to_string()))
    }

    async fn get_release(&self, tag_name: &str) -> Result<Release, HostError> {
        let mut state = self.record(Call::GetRelease(tag_name.to_string()));
        release_mut(&mut state, tag_name).map(|r| r.clone())
    }

    async fn create_tag(&self, name: &str, commit_ref: &str) -> Result<Tag, HostError> {
        let mut state = self.record(Call::CreateTag {
            name: name.to_string(),
            commit_ref: commit_ref.to_string(),
        });
        if state.tags.iter().any(|t| t.name == name) {
            return Err(HostError::Conflict(name.to_string()));
        }
        let tag = Tag {
            name: name.to_string(),
            commit: Commit::new(commit_ref),
            release: None,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release, HostError> {
        let mut state = self.record(Call::CreateRelease(release.tag_name.clone()));
        if state.releases.iter().any(|r| r.tag_name == release.tag_name) {
            return Err(HostError::Conflict(release.tag_name.clone()));
        }
        let tag = state
            .tags
            .iter_mut()
            .find(|t| t.name == release.tag_name)
            .ok_or_else(|| HostError::NotFound(release.tag_name.clone()))?;
        tag.release = Some(ReleaseNote {
            tag_name: release.tag_name.clone(),
            description: release.description.clone(),
        });
        let created = Release {
            name: Some(release.name.clone()),
            tag_name: release.tag_name.clone(),
            description: release.description.clone(),
            commit: Some(tag.commit.clone()),
            assets: Default::default(),
        };
        state.releases.push(created.clone());
        Ok(created)
    }

    async fn update_release(
        &self,
        tag_name: &str,
        update: &ReleaseUpdate,
    ) -> Result<Release, HostError> {
        let mut state = self.record(Call::UpdateRelease {
            tag: tag_name.to_string(),
            description: update.description.clone(),
        });
        let release = release_mut(&mut state, tag_name)?;
        release.name = Some(update.name.clone());
        if let Some(description) = &update.description {
            release.description = Some(description.clone());
        }
        Ok(release.clone())
    }

    async fn list_release_links(&self, tag_name: &str) -> Result<Vec<AssetLink>, HostError> {
        let mut state = self.record(Call::ListLinks(tag_name.to_string()));
        release_mut(&mut state, tag_name).map(|r| r.assets.links.clone())
    }

    async fn create_release_link(
        &self,
        tag_name: &str,
        name: &str,
        url: &str,
    ) -> Result<AssetLink, HostError> {
        let mut state = self.record(Call::CreateLink {
            tag: tag_name.to_string(),
            name: name.to_string(),
        });
        state.next_id += 1;
        let link = AssetLink {
            id: state.next_id,
            name: name.to_string(),
            url: url.to_string(),
        };

        let lost = match state.lost_link_responses.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };

        release_mut(&mut state, tag_name)?.assets.links.push(link.clone());
        if lost {
            return Err(HostError::Status {
                status: 502,
                url: url.to_string(),
            });
        }
        Ok(link)
    }

    async fn delete_release_link(&self, tag_name: &str, link_id: u64) -> Result<(), HostError> {
        let mut state = self.record(Call::DeleteLink {
            tag: tag_name.to_string(),
            id: link_id,
        });
        let links = &mut release_mut(&mut state, tag_name)?.assets.links;
        let before = links.len();
        links.retain(|l| l.id != link_id);
        if links.len() == before {
            return Err(HostError::NotFound(link_id.to_string()));
        }
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile, HostError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let contents = std::fs::read(path)?;
        let mut state = self.record(Call::Upload(name.clone()));

        if let Some(remaining) = state.upload_failures.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HostError::Status {
                    status: 503,
                    url: format!("{}/uploads", WEB_URL),
                });
            }
        }

        state.next_id += 1;
        let url = format!("{}/uploads/{}/{}", WEB_URL, state.next_id, name);
        state.files.insert(url.clone(), contents);
        Ok(UploadedFile {
            markdown: format!("[{}]({})", name, url),
            url,
        })
    }

    async fn download_file(&self, url: &str, destination: &Path) -> Result<(), HostError> {
        let state = self.record(Call::Download(url.to_string()));
        let contents = state
            .files
            .get(url)
            .ok_or_else(|| HostError::NotFound(url.to_string()))?;
        std::fs::write(destination, contents)?;
        Ok(())
    }
}
