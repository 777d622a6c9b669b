//! Error types for Iris core operations.
//!
//! This module defines the error types used throughout the `iris-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Iris core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Digest string is malformed or uses an unknown algorithm.
    #[error("Invalid digest '{digest}': {reason}")]
    InvalidDigest {
        /// The rejected digest string.
        digest: String,
        /// Reason the digest was rejected.
        reason: String,
    },

    /// Hash algorithm is not registered.
    #[error("Unsupported digest algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The requested algorithm name.
        algorithm: String,
    },

    /// Inline descriptor data failed its integrity checks.
    #[error("Parsing failed: {0}")]
    ParsingFailed(#[from] DataError),

    /// Descriptor search produced no candidates.
    #[error("Not found: {reason}")]
    NotFound {
        /// Description of what was searched for.
        reason: String,
    },

    /// Platform string could not be parsed.
    #[error("Invalid platform '{platform}': {reason}")]
    InvalidPlatform {
        /// The rejected platform string.
        platform: String,
        /// Reason the platform was rejected.
        reason: String,
    },
}

impl Error {
    /// Returns true for any embedded-data extraction failure, whatever the cause.
    #[must_use]
    pub const fn is_parsing_failed(&self) -> bool {
        matches!(self, Self::ParsingFailed(_))
    }

    /// Returns true when a search found nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Cause of an embedded-data extraction failure.
///
/// All variants are reported through [`Error::ParsingFailed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The descriptor carries no inline data.
    #[error("descriptor has no inline data")]
    MissingData,

    /// Inline data length differs from the descriptor size.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Size recorded in the descriptor.
        expected: u64,
        /// Length of the inline data.
        actual: u64,
    },

    /// Inline data does not hash to the descriptor digest.
    #[error("data digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Digest recorded in the descriptor.
        expected: String,
        /// Digest computed over the inline data.
        actual: String,
    },
}
