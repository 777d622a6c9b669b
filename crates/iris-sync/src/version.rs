//! Semantic versions in tag names.
//!
//! Tags are often loose versions (`v1.2`, `3`, `1.4.0-rc.1`). A tag is read
//! as a version after dropping a leading `v` and padding missing minor and
//! patch components with zeros. Ranges use Cargo requirement syntax, with
//! comparators separated by commas or spaces and `||` between alternatives:
//!
//! - `>=3.18` → 3.18.0 and later
//! - `>=1.0 <2.0` → any 1.x
//! - `~1.2 || ^3` → 1.2.x, or 3.x

use semver::{Version, VersionReq};

use crate::error::FilterError;

/// Reads a tag as a semantic version.
///
/// # Examples
///
/// ```
/// use iris_sync::parse_tag_version;
///
/// assert_eq!(parse_tag_version("v1.2").unwrap().to_string(), "1.2.0");
/// assert_eq!(parse_tag_version("3").unwrap().to_string(), "3.0.0");
/// assert!(parse_tag_version("latest").is_none());
/// ```
#[must_use]
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let tag = tag.strip_prefix(['v', 'V']).unwrap_or(tag);
    let split = tag.find(['-', '+']).unwrap_or(tag.len());
    let (core, suffix) = tag.split_at(split);

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty()
        || parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded).ok()
}

/// A compiled semver range.
#[derive(Debug, Clone)]
pub struct SemverRange {
    source: String,
    alternatives: Vec<VersionReq>,
}

impl SemverRange {
    /// Compiles a range.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSemverRange`] when any alternative fails
    /// to parse.
    pub fn parse(range: &str) -> Result<Self, FilterError> {
        let alternatives = range
            .split("||")
            .map(|alt| {
                VersionReq::parse(&normalize_comparators(alt)).map_err(|e| {
                    FilterError::InvalidSemverRange {
                        range: range.to_string(),
                        source: e,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: range.to_string(),
            alternatives,
        })
    }

    /// Returns true when `tag` is a version inside any alternative.
    #[must_use]
    pub fn matches_tag(&self, tag: &str) -> bool {
        parse_tag_version(tag).is_some_and(|v| self.matches(&v))
    }

    /// Returns true when `version` is inside any alternative.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Rewrites space-separated comparators into the comma form `VersionReq`
/// expects, keeping an operator attached to a version written after a space.
fn normalize_comparators(alternative: &str) -> String {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();

    for token in alternative
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending_op.push_str(token);
        } else {
            comparators.push(format!("{pending_op}{token}"));
            pending_op.clear();
        }
    }
    if !pending_op.is_empty() {
        comparators.push(pending_op);
    }
    comparators.join(", ")
}
