//! Repository objects as returned by the host

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    /// Ordering key the host uses when listing tags by update time
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
}

impl Commit {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            committed_date: None,
        }
    }
}

/// Release summary embedded in a tag listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub tag_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: Commit,
    /// Absent for plain tags without release metadata
    #[serde(default)]
    pub release: Option<ReleaseNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLink {
    pub id: u64,
    pub name: String,
    pub url: String,
}

/// Source archive generated by the host for a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArchive {
    pub format: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAssets {
    #[serde(default)]
    pub links: Vec<AssetLink>,
    #[serde(default)]
    pub sources: Vec<SourceArchive>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub commit: Option<Commit>,
    #[serde(default)]
    pub assets: ReleaseAssets,
}

impl Release {
    pub fn commit_sha(&self) -> Option<&str> {
        self.commit.as_ref().map(|c| c.id.as_str())
    }
}

/// Payload for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub name: String,
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload for updating a release.
///
/// A `None` description is left out of the request so the existing text is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A local file stored on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Absolute URL suitable for a release link
    pub url: String,
    pub markdown: String,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_with_release_and_offset_date_deserializes() {
        let tag = serde_json::from_value::<Tag>(json!({
            "name": "v1.0.0",
            "message": null,
            "commit": {
                "id": "2695effb5807a22ff3d138d593fd856244e155e7",
                "committed_date": "2012-05-28T04:42:42-07:00"
            },
            "release": { "tag_name": "v1.0.0", "description": "Amazing release" }
        }))
        .unwrap();

        assert_eq!(tag.name, "v1.0.0");
        assert_eq!(
            tag.commit.committed_date.map(|d| d.to_rfc3339()),
            Some("2012-05-28T11:42:42+00:00".to_string())
        );
        assert_eq!(
            tag.release.and_then(|r| r.description),
            Some("Amazing release".to_string())
        );
    }

    #[test]
    fn release_with_null_fields_deserializes() {
        let release = serde_json::from_value::<Release>(json!({
            "name": null,
            "tag_name": "v1.0.0",
            "description": null,
            "assets": {
                "count": 2,
                "links": [{ "id": 1, "name": "app.tgz", "url": "https://host/app.tgz", "link_type": "other" }],
                "sources": [{ "format": "zip", "url": "https://host/archive/v1.0.0/project-v1.0.0.zip" }]
            }
        }))
        .unwrap();

        assert_eq!(release.name, None);
        assert_eq!(release.commit_sha(), None);
        assert_eq!(release.assets.links.len(), 1);
        assert_eq!(release.assets.sources[0].format, "zip");
    }

    #[test]
    fn release_update_omits_missing_description() {
        let value = serde_json::to_value(ReleaseUpdate {
            name: "v1.0.0".to_string(),
            description: None,
        })
        .unwrap();

        assert_eq!(value, json!({ "name": "v1.0.0" }));
    }
}
