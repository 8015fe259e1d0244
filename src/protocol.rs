//! Request and response messages exchanged with the CI orchestrator

use serde::{Deserialize, Serialize};

use crate::config::Source;

/// Version cursor persisted by the orchestrator between invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl Version {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            commit_sha: None,
        }
    }

    pub fn with_commit_sha(mut self, commit_sha: Option<&str>) -> Self {
        self.commit_sha = commit_sha.filter(|sha| !sha.is_empty()).map(str::to_string);
        self
    }
}

/// One display row of release metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPair {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub markdown: bool,
}

impl MetadataPair {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            markdown: false,
        }
    }

    pub fn markdown(name: &str, value: &str) -> Self {
        Self {
            markdown: true,
            ..Self::new(name, value)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub source: Source,
    /// Absent (or `null`) on the very first check
    #[serde(default)]
    pub version: Option<Version>,
}

impl CheckRequest {
    /// Checkpoint supplied by the orchestrator, ignoring an empty tag
    pub fn checkpoint(&self) -> Option<&Version> {
        self.version.as_ref().filter(|v| !v.tag.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InRequest {
    pub source: Source,
    pub version: Version,
    #[serde(default)]
    pub params: InParams,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InParams {
    /// Asset link name patterns to download; empty downloads every link
    pub globs: Vec<String>,
    /// Source archive formats to download, e.g. `zip`, `tar.gz`
    pub include_sources: Vec<String>,
    pub include_source_tarball: bool,
    pub include_source_zip: bool,
}

impl InParams {
    /// Requested source archive formats, honouring the legacy boolean flags
    pub fn source_formats(&self) -> Vec<String> {
        if !self.include_sources.is_empty() {
            return self.include_sources.clone();
        }
        let mut formats = Vec::new();
        if self.include_source_tarball {
            formats.push("tar.gz".to_string());
        }
        if self.include_source_zip {
            formats.push("zip".to_string());
        }
        formats
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutRequest {
    pub source: Source,
    pub params: OutParams,
}

/// `out` parameters; every path is relative to the build output directory
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutParams {
    /// File containing the tag name
    pub tag: String,
    /// Prepended to the tag read from `tag`
    pub tag_prefix: String,
    /// File containing the commit the tag is created at
    pub commitish: Option<String>,
    /// File containing the release display name
    pub name: Option<String>,
    /// File containing the release description
    pub body: Option<String>,
    /// Patterns selecting the artifacts to attach
    pub globs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InResponse {
    pub version: Version,
    pub metadata: Vec<MetadataPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutResponse {
    pub version: Version,
    pub metadata: Vec<MetadataPair>,
}
