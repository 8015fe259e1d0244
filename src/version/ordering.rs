//! Version tokens and their total order
//!
//! A token is a dot-separated run of non-negative integers optionally
//! followed by a qualifier:
//!
//! - `1`, `1.2`, `1.2.3.4`: bare release
//! - `1.2.3-rc.1`: pre-release (`-`), sorts before the bare release
//! - `1.2.3+build`, `1.2.3_ora`, `1.2.3.final`: post-release (`+`, `_`, `.`),
//!   sorts after the bare release
//!
//! Precedence is decided by, in order: release segments compared
//! numerically with missing trailing segments as zero, qualifier class,
//! qualifier text (bytewise), and finally the raw text so that distinct
//! tokens never compare equal.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Qualifier {
    Pre(String),
    Post(String),
}

impl Qualifier {
    fn rank(qualifier: Option<&Self>) -> u8 {
        match qualifier {
            Some(Qualifier::Pre(_)) => 0,
            None => 1,
            Some(Qualifier::Post(_)) => 2,
        }
    }

    fn text(&self) -> &str {
        match self {
            Qualifier::Pre(text) | Qualifier::Post(text) => text,
        }
    }
}

/// Comparable version extracted from a tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken {
    raw: String,
    release: Vec<u64>,
    qualifier: Option<Qualifier>,
}

impl VersionToken {
    /// Parse a version string, returning `None` when it is not well-formed
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut release = Vec::new();
        let mut pos = 0;

        loop {
            let start = pos;
            while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
            if pos == start {
                return None;
            }
            release.push(text[start..pos].parse().ok()?);

            // a dot only continues the release when a digit follows
            match (bytes.get(pos), bytes.get(pos + 1)) {
                (Some(b'.'), Some(next)) if next.is_ascii_digit() => pos += 1,
                _ => break,
            }
        }

        let rest = &text[pos..];
        let qualifier = match rest.as_bytes().first() {
            None => None,
            Some(_) if rest.len() == 1 => return None,
            Some(b'-') => Some(Qualifier::Pre(rest[1..].to_string())),
            Some(b'+' | b'_' | b'.') => Some(Qualifier::Post(rest[1..].to_string())),
            Some(_) => return None,
        };

        Some(Self {
            raw: text.to_string(),
            release,
            qualifier,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn is_prerelease(&self) -> bool {
        matches!(self.qualifier, Some(Qualifier::Pre(_)))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Numeric comparison of release segments, padding the shorter side with zeros
fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Total order over version tokens
pub fn compare(a: &VersionToken, b: &VersionToken) -> Ordering {
    compare_release(&a.release, &b.release)
        .then_with(|| {
            Qualifier::rank(a.qualifier.as_ref()).cmp(&Qualifier::rank(b.qualifier.as_ref()))
        })
        .then_with(|| {
            let left = a.qualifier.as_ref().map(Qualifier::text).unwrap_or("");
            let right = b.qualifier.as_ref().map(Qualifier::text).unwrap_or("");
            left.cmp(right)
        })
        .then_with(|| a.raw.cmp(&b.raw))
}

impl Ord for VersionToken {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialOrd for VersionToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
