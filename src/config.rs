use serde::Deserialize;

// =============================================================================
// Host constants
// =============================================================================

/// Default base URL for the GitLab REST API
pub const DEFAULT_GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("gitlab-release-resource/", env!("CARGO_PKG_VERSION"));

/// Page size used when walking the tag and release listings
pub const TAGS_PER_PAGE: u32 = 100;

// =============================================================================
// Version resolution constants
// =============================================================================

/// Tag filter used when the source does not configure one.
///
/// Accepts an optional leading `v` and captures the remainder.
pub const DEFAULT_TAG_FILTER: &str = r"^v?([^v].*)$";

// =============================================================================
// Synchronization constants
// =============================================================================

/// Attempts made for a single asset upload before the publish is aborted
pub const MAX_UPLOAD_ATTEMPTS: u32 = 10;

/// `source` block of every resource request
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Source {
    /// Project path on the host, e.g. `group/project`
    pub repository: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Alternate API base URL, e.g. `https://gitlab.example.com/api/v4`
    #[serde(default)]
    pub gitlab_api_url: Option<String>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    /// Regular expression with exactly one capture group selecting version tags
    #[serde(default)]
    pub tag_filter: Option<String>,
}

impl Source {
    pub fn new(repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            access_token: None,
            gitlab_api_url: None,
            insecure: false,
            tag_filter: None,
        }
    }

    /// API base URL, falling back to gitlab.com
    pub fn api_url(&self) -> &str {
        self.gitlab_api_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_GITLAB_API_URL)
    }

    /// Configured tag filter, treating an empty string as unset
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref().filter(|f| !f.is_empty())
    }
}
