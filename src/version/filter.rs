//! Tag filter selecting version-bearing tags

use regex::Regex;

use crate::config::DEFAULT_TAG_FILTER;
use crate::error::ResourceError;
use crate::version::ordering::VersionToken;

/// Regular expression with exactly one capture group.
///
/// A tag is version-bearing when the whole name matches and the captured
/// text parses as a [`VersionToken`].
#[derive(Debug, Clone)]
pub struct TagFilter {
    re: Regex,
}

impl TagFilter {
    /// Compile `pattern`, or the default filter when `None`
    pub fn new(pattern: Option<&str>) -> Result<Self, ResourceError> {
        let pattern = pattern.unwrap_or(DEFAULT_TAG_FILTER);
        let invalid = |reason: String| ResourceError::InvalidTagFilter {
            pattern: pattern.to_string(),
            reason,
        };

        let user = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
        let groups = user.captures_len() - 1;
        if groups != 1 {
            return Err(invalid(format!(
                "expected exactly one capture group, found {}",
                groups
            )));
        }

        let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { re })
    }

    /// Text captured from `tag`, if the whole tag matches
    pub fn capture<'t>(&self, tag: &'t str) -> Option<&'t str> {
        self.re
            .captures(tag)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Version token for `tag`, or `None` when the tag is not version-bearing
    pub fn parse(&self, tag: &str) -> Option<VersionToken> {
        self.capture(tag).and_then(VersionToken::parse)
    }
}
