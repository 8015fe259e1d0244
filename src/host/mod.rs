//! Repository host layer
//!
//! Both engines talk to the hosted Git platform only through the
//! [`RepositoryHost`] trait, so they can run against an in-memory host in tests.
//!
//! # Modules
//!
//! - [`repository`]: the `RepositoryHost` trait
//! - [`types`]: tags, releases and asset links as the host returns them
//! - [`error`]: host error taxonomy
//! - [`gitlab`]: GitLab REST API v4 implementation

pub mod error;
pub mod gitlab;
pub mod repository;
pub mod types;

pub use error::HostError;
pub use gitlab::GitLabHost;
pub use repository::RepositoryHost;
