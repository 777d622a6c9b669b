//! Tag filtering.
//!
//! Patterns are unanchored regular expressions: `rc` matches `1.0-rc1`, and
//! a pattern must carry its own `^`/`$` to match whole tags.

use regex::Regex;

use crate::config::TagFilterSet;
use crate::error::FilterError;
use crate::version::SemverRange;

/// Compiles one regex, naming it on failure.
///
/// # Errors
///
/// Returns [`FilterError::InvalidPattern`] when `pattern` does not compile.
pub fn compile_pattern(pattern: &str) -> Result<Regex, FilterError> {
    Regex::new(pattern).map_err(|e| FilterError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

/// A [`TagFilterSet`] with every pattern compiled.
#[derive(Debug, Clone)]
pub struct TagFilter {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
    semver_range: Option<SemverRange>,
}

impl TagFilter {
    /// Compiles every pattern and the range of `set`.
    ///
    /// # Errors
    ///
    /// Returns the first pattern or range that fails to compile.
    pub fn compile(set: &TagFilterSet) -> Result<Self, FilterError> {
        let allow = set
            .allow
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>, _>>()?;
        let deny = set
            .deny
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>, _>>()?;
        let semver_range = if set.semver_range.is_empty() {
            None
        } else {
            Some(SemverRange::parse(&set.semver_range)?)
        };

        Ok(Self {
            allow,
            deny,
            semver_range,
        })
    }

    /// Returns true when `tag` passes allow, deny and the semver range.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        (self.allow.is_empty() || self.allow.iter().any(|re| re.is_match(tag)))
            && !self.deny.iter().any(|re| re.is_match(tag))
            && self
                .semver_range
                .as_ref()
                .map_or(true, |range| range.matches_tag(tag))
    }

    /// Returns the tags that pass, in input order.
    #[must_use]
    pub fn apply<S: AsRef<str>>(&self, tags: &[S]) -> Vec<String> {
        tags.iter()
            .map(AsRef::as_ref)
            .filter(|tag| self.matches(tag))
            .map(ToString::to_string)
            .collect()
    }
}

/// Filters `tags` through `set`.
///
/// All patterns are compiled before any tag is examined, so an invalid
/// pattern fails the call even for an empty tag list.
///
/// # Examples
///
/// ```
/// use iris_sync::{filter_tag_list, TagFilterSet};
///
/// let set = TagFilterSet::new().with_allow("^v.*").with_deny("^v0\\.");
/// let tags = ["v1.0", "v0.1", "latest"];
/// assert_eq!(filter_tag_list(&set, &tags).unwrap(), ["v1.0"]);
/// ```
///
/// # Errors
///
/// Returns [`FilterError`] naming the first pattern or range that fails to
/// compile; no partial result is produced.
pub fn filter_tag_list<S: AsRef<str>>(
    set: &TagFilterSet,
    tags: &[S],
) -> Result<Vec<String>, FilterError> {
    Ok(TagFilter::compile(set)?.apply(tags))
}

/// Pooled cleanup exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    patterns: Vec<(String, Regex)>,
}

impl ExclusionList {
    /// Compiles `patterns`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] for the first pattern that
    /// fails to compile.
    pub fn compile<'a, I>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile_pattern(p).map(|re| (p.to_string(), re)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns the first pattern matching `tag`.
    #[must_use]
    pub fn first_match(&self, tag: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(tag))
            .map(|(p, _)| p.as_str())
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true when there are no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
