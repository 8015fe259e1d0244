//! GitLab REST API v4 host implementation

use std::path::Path;

use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::{Source, USER_AGENT};
use crate::host::error::HostError;
use crate::host::repository::RepositoryHost;
use crate::host::types::{AssetLink, NewRelease, Page, Release, ReleaseUpdate, Tag, UploadedFile};

/// Header carrying the personal/project access token
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Pagination cursor header; empty on the last page
const NEXT_PAGE_HEADER: &str = "x-next-page";

/// API path suffix removed to obtain the web root for uploads
const API_PATH_SUFFIX: &str = "/api/v4";

/// Response from the project uploads endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    #[serde(default)]
    full_path: Option<String>,
    #[serde(default)]
    markdown: String,
}

/// Host implementation for a single GitLab project
pub struct GitLabHost {
    client: reqwest::Client,
    api_url: Url,
    web_url: Url,
    project: String,
    access_token: Option<String>,
}

impl GitLabHost {
    pub fn new(
        api_url: &str,
        project: &str,
        access_token: Option<&str>,
        insecure: bool,
    ) -> Result<Self, HostError> {
        if project.trim().is_empty() {
            return Err(HostError::InvalidUrl("empty repository".to_string()));
        }

        let api_url = Url::parse(api_url.trim_end_matches('/'))
            .map_err(|e| HostError::InvalidUrl(format!("{}: {}", api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(HostError::InvalidUrl(api_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            client,
            web_url: web_root(&api_url),
            api_url,
            project: project.to_string(),
            access_token: access_token.filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    pub fn from_source(source: &Source) -> Result<Self, HostError> {
        Self::new(
            source.api_url(),
            &source.repository,
            source.access_token.as_deref(),
            source.insecure,
        )
    }

    /// `{api}/projects/{url-encoded project}/{segments...}`
    fn project_url(&self, segments: &[&str]) -> Result<Url, HostError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| HostError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .push("projects")
            .push(&self.project)
            .extend(segments);
        Ok(url)
    }

    /// Resolve a link or upload reference into an absolute URL.
    ///
    /// Upload references (`/uploads/<hash>/<file>`) are project-relative and
    /// are served from the web root, not the API.
    fn resolve_file_url(&self, reference: &str) -> Result<Url, HostError> {
        if let Ok(url) = Url::parse(reference) {
            return Ok(url);
        }

        let root = self.web_url.as_str().trim_end_matches('/');
        let absolute = if reference.starts_with("/uploads/") {
            format!("{}/{}{}", root, self.project, reference)
        } else if reference.starts_with('/') {
            format!("{}{}", root, reference)
        } else {
            format!("{}/{}", root, reference)
        };

        Url::parse(&absolute).map_err(|e| HostError::InvalidUrl(format!("{}: {}", absolute, e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, subject: &str) -> Result<Response, HostError> {
        let response = builder.send().await?;
        check_status(response, subject)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        page: u32,
        per_page: u32,
        order_by: &str,
    ) -> Result<Page<T>, HostError> {
        let mut url = self.project_url(segments)?;
        url.query_pairs_mut()
            .append_pair("order_by", order_by)
            .append_pair("sort", "desc")
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());

        debug!("Fetching page {} of {}", page, segments.join("/"));
        let response = self
            .send(self.request(Method::GET, url), &self.project)
            .await?;
        let next_page = next_page(response.headers());
        let items = decode(response).await?;

        Ok(Page { items, next_page })
    }
}

/// Drop the `/api/v4` suffix from the API base URL
fn web_root(api_url: &Url) -> Url {
    let mut url = api_url.clone();
    let path = api_url.path().trim_end_matches('/');
    let root = path.strip_suffix(API_PATH_SUFFIX).unwrap_or(path).to_string();
    url.set_path(&root);
    url.set_query(None);
    url
}

fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(NEXT_PAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn check_status(response: Response, subject: &str) -> Result<Response, HostError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(HostError::NotFound(subject.to_string()));
    }

    if status == StatusCode::CONFLICT {
        return Err(HostError::Conflict(subject.to_string()));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(HostError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("GitLab API returned status {}: {}", status, response.url());
        return Err(HostError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }

    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HostError> {
    response.json().await.map_err(|e| {
        warn!("Failed to parse GitLab response: {}", e);
        HostError::InvalidResponse(e.to_string())
    })
}

#[async_trait::async_trait]
impl RepositoryHost for GitLabHost {
    async fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<Tag>, HostError> {
        self.get_page(&["repository", "tags"], page, per_page, "updated")
            .await
    }

    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Page<Release>, HostError> {
        self.get_page(&["releases"], page, per_page, "released_at")
            .await
    }

    async fn get_tag(&self, name: &str) -> Result<Tag, HostError> {
        let url = self.project_url(&["repository", "tags", name])?;
        let response = self.send(self.request(Method::GET, url), name).await?;
        decode(response).await
    }

    async fn get_release(&self, tag_name: &str) -> Result<Release, HostError> {
        let url = self.project_url(&["releases", tag_name])?;
        let response = self.send(self.request(Method::GET, url), tag_name).await?;
        decode(response).await
    }

    async fn create_tag(&self, name: &str, commit_ref: &str) -> Result<Tag, HostError> {
        let url = self.project_url(&["repository", "tags"])?;
        let body = json!({ "tag_name": name, "ref": commit_ref, "message": name });
        let response = self
            .send(self.request(Method::POST, url).json(&body), name)
            .await?;
        decode(response).await
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release, HostError> {
        let url = self.project_url(&["releases"])?;
        let response = self
            .send(
                self.request(Method::POST, url).json(release),
                &release.tag_name,
            )
            .await?;
        decode(response).await
    }

    async fn update_release(
        &self,
        tag_name: &str,
        update: &ReleaseUpdate,
    ) -> Result<Release, HostError> {
        let url = self.project_url(&["releases", tag_name])?;
        let response = self
            .send(self.request(Method::PUT, url).json(update), tag_name)
            .await?;
        decode(response).await
    }

    async fn list_release_links(&self, tag_name: &str) -> Result<Vec<AssetLink>, HostError> {
        let url = self.project_url(&["releases", tag_name, "assets", "links"])?;
        let response = self.send(self.request(Method::GET, url), tag_name).await?;
        decode(response).await
    }

    async fn create_release_link(
        &self,
        tag_name: &str,
        name: &str,
        url: &str,
    ) -> Result<AssetLink, HostError> {
        let endpoint = self.project_url(&["releases", tag_name, "assets", "links"])?;
        let body = json!({ "name": name, "url": url });
        let response = self
            .send(self.request(Method::POST, endpoint).json(&body), name)
            .await?;
        decode(response).await
    }

    async fn delete_release_link(&self, tag_name: &str, link_id: u64) -> Result<(), HostError> {
        let id = link_id.to_string();
        let url = self.project_url(&["releases", tag_name, "assets", "links", &id])?;
        self.send(self.request(Method::DELETE, url), &id).await?;
        Ok(())
    }

    /// The file is read into memory whole before the multipart request is built.
    async fn upload_file(&self, path: &Path) -> Result<UploadedFile, HostError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let contents = tokio::fs::read(path).await?;

        let form = Form::new().part("file", Part::bytes(contents).file_name(file_name.clone()));
        let url = self.project_url(&["uploads"])?;
        let response = self
            .send(self.request(Method::POST, url).multipart(form), &file_name)
            .await?;
        let upload: UploadResponse = decode(response).await?;

        let reference = upload.full_path.as_deref().unwrap_or(&upload.url);
        Ok(UploadedFile {
            url: self.resolve_file_url(reference)?.to_string(),
            markdown: upload.markdown,
        })
    }

    async fn download_file(&self, url: &str, destination: &Path) -> Result<(), HostError> {
        let url = self.resolve_file_url(url)?;
        debug!("Downloading {} to {:?}", url, destination);

        let subject = url.to_string();
        let mut response = self.send(self.request(Method::GET, url), &subject).await?;
        let mut file = tokio::fs::File::create(destination).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}
