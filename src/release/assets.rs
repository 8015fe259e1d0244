//! Local artifact resolution

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ResourceError;

/// Expand `globs` under `base` into the files to publish.
///
/// Each pattern must match at least one file. Matches are sorted per
/// pattern; a file matched by several patterns is returned once.
pub fn resolve_assets(base: &Path, globs: &[String]) -> Result<Vec<PathBuf>, ResourceError> {
    let base = base.to_str().ok_or_else(|| {
        ResourceError::Configuration(format!("non UTF-8 directory {:?}", base))
    })?;
    let base = glob::Pattern::escape(base);

    let mut assets: Vec<PathBuf> = Vec::new();
    for pattern in globs {
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        let mut matches = glob::glob(&full)
            .map_err(|e| {
                ResourceError::Configuration(format!("invalid glob '{}': {}", pattern, e))
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ResourceError::Io(e.into_error()))?;
        matches.retain(|path| path.is_file());

        if matches.is_empty() {
            return Err(ResourceError::GlobMismatch(pattern.clone()));
        }

        matches.sort();
        debug!("Glob '{}' matched {} file(s)", pattern, matches.len());
        for path in matches {
            if !assets.contains(&path) {
                assets.push(path);
            }
        }
    }

    Ok(assets)
}

/// Base name used as the link name for `path`
pub fn asset_name(path: &Path) -> Result<String, ResourceError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ResourceError::Configuration(format!("{:?} has no file name", path)))
}
