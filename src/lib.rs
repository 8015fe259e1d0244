//! Concourse resource for GitLab releases.
//!
//! - [`version`]: tag filtering, version ordering and new-release detection (`check`)
//! - [`release`]: release publishing (`out`) and retrieval (`in`)
//! - [`host`]: the repository host protocol and its GitLab implementation
//! - [`commands`]: JSON request/response plumbing for the three entry points

pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod protocol;
pub mod release;
pub mod version;
