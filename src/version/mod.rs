//! Version resolution layer for the `check` entry point
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────▶│   Checker   │◀────│   Filter    │
//! │ (paginate)  │     │ (select)    │     │ (tag→token) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │    Host     │                         │  Ordering   │
//! │  (GitLab)   │                         │ (total cmp) │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: paginated tag/release listing with the "until marker" shortcut
//! - [`checker`]: computes the versions published since a checkpoint
//! - [`filter`]: single-capture-group tag filter
//! - [`ordering`]: version tokens and their total order

pub mod catalog;
pub mod checker;
pub mod filter;
pub mod ordering;
