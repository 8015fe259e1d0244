//! Release layer for the `out` and `in` entry points
//!
//! # Modules
//!
//! - [`sync`]: create-or-update of tag and release, full replacement of asset links
//! - [`fetch`]: materialises a release and its assets into a directory
//! - [`assets`]: local artifact resolution from glob patterns
//! - [`metadata`]: display projection of a release

pub mod assets;
pub mod fetch;
pub mod metadata;
pub mod sync;
