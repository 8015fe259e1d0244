use thiserror::Error;

use crate::host::HostError;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Invalid tag filter {pattern:?}: {reason}")]
    InvalidTagFilter { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("could not find file that matches glob '{0}'")]
    GlobMismatch(String),

    #[error("Tag {0} does not exist and no commitish was given to create it")]
    MissingCommitish(String),

    #[error("Uploading {file} failed after {attempts} attempts: {source}")]
    UploadRetriesExhausted {
        file: String,
        attempts: u32,
        #[source]
        source: HostError,
    },

    #[error("No release for tag {0}")]
    ReleaseNotFound(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
