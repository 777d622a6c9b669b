//! Error types for tag filtering, configuration and cleanup.

use std::fmt;
use std::path::PathBuf;

use iris_registry::RegistryError;
use thiserror::Error;

/// Errors raised while compiling a tag filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// An allow, deny or exclusion pattern is not a valid regex.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compile error.
        #[source]
        source: regex::Error,
    },

    /// A semver range could not be parsed.
    #[error("invalid semver range {range:?}: {source}")]
    InvalidSemverRange {
        /// The offending range.
        range: String,
        /// Parse error.
        #[source]
        source: semver::Error,
    },
}

impl FilterError {
    /// Returns the pattern or range that failed to compile.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::InvalidPattern { pattern, .. } => pattern,
            Self::InvalidSemverRange { range, .. } => range,
        }
    }
}

/// Errors raised while loading sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML for the expected schema.
    #[error("failed to parse config: {source}")]
    Yaml {
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration parsed but is semantically invalid.
    #[error("invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Errors returned by a cleanup run.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// The target is not a valid repository reference.
    #[error("invalid cleanup target {target}: {source}")]
    InvalidTarget {
        /// Target string from the sync rule.
        target: String,
        /// Parse error.
        #[source]
        source: RegistryError,
    },

    /// The target's tags could not be listed.
    #[error("failed to list tags of {target}: {source}")]
    ListTags {
        /// Target repository.
        target: String,
        /// Registry error.
        #[source]
        source: RegistryError,
    },

    /// A sibling rule's tag filter failed to compile.
    #[error("failed to filter tags of {target}: {source}")]
    Filter {
        /// Target repository.
        target: String,
        /// Filter error.
        #[source]
        source: FilterError,
    },

    /// A cleanup exclusion pattern failed to compile.
    #[error("invalid exclusion pattern for {target}: {source}")]
    ExclusionPattern {
        /// Target repository.
        target: String,
        /// Filter error naming the pattern.
        #[source]
        source: FilterError,
    },

    /// One or more deletions failed or the run was canceled.
    #[error(transparent)]
    Deletions(DeletionFailures),
}

impl CleanupError {
    /// Returns true when the run stopped because it was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        match self {
            Self::Deletions(failures) => failures.is_canceled(),
            Self::ListTags { source, .. } => source.is_canceled(),
            _ => false,
        }
    }

    /// Returns the per-tag failures, if the run reached the delete phase.
    #[must_use]
    pub const fn deletion_failures(&self) -> Option<&DeletionFailures> {
        match self {
            Self::Deletions(failures) => Some(failures),
            _ => None,
        }
    }
}

/// A single failure recorded during the delete phase.
#[derive(Debug, Error)]
pub enum DeletionFailure {
    /// Deleting one tag failed.
    #[error("failed to delete tag {target}:{tag}: {source}")]
    Tag {
        /// Target repository.
        target: String,
        /// Tag that could not be deleted.
        tag: String,
        /// Registry error.
        #[source]
        source: RegistryError,
    },

    /// The run was canceled before these tags were attempted.
    #[error("cleanup canceled with {} tag(s) remaining", .remaining.len())]
    Canceled {
        /// Scheduled tags never attempted.
        remaining: Vec<String>,
    },
}

/// Ordered aggregate of delete-phase failures for one target.
///
/// Failures appear in tag listing order; a cancellation marker, if present,
/// is always last.
#[derive(Debug, Default)]
pub struct DeletionFailures {
    target: String,
    deleted: Vec<String>,
    failures: Vec<DeletionFailure>,
}

impl DeletionFailures {
    /// Creates an empty aggregate for `target`.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            deleted: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Records a successful deletion.
    pub fn record_deleted(&mut self, tag: impl Into<String>) {
        self.deleted.push(tag.into());
    }

    /// Records a failure.
    pub fn push(&mut self, failure: DeletionFailure) {
        self.failures.push(failure);
    }

    /// Target repository.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Tags deleted before or between failures.
    #[must_use]
    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    /// Returns true when nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failures, including a cancellation marker.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Iterates over failures in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeletionFailure> {
        self.failures.iter()
    }

    /// Returns true when the run was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.failures
            .iter()
            .any(|f| matches!(f, DeletionFailure::Canceled { .. }))
    }

    /// Tags whose deletion failed, excluding unattempted ones.
    pub fn failed_tags(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().filter_map(|f| match f {
            DeletionFailure::Tag { tag, .. } => Some(tag.as_str()),
            DeletionFailure::Canceled { .. } => None,
        })
    }
}

impl<'a> IntoIterator for &'a DeletionFailures {
    type Item = &'a DeletionFailure;
    type IntoIter = std::slice::Iter<'a, DeletionFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for DeletionFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeletionFailures {}
