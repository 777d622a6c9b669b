//! # Iris Core
//!
//! Content-addressable identity and selection primitives for OCI registry
//! artifacts.
//!
//! This crate provides the value types the sync engine and registry client
//! exchange:
//!
//! - [`Digest`] / [`Algorithm`] - validated `<algorithm>:<hex>` content digests
//! - [`Descriptor`] - a content reference with equality (`==`) and content
//!   identity ([`Descriptor::same`]) comparisons and verified inline data
//! - [`Platform`] - OS/architecture with exact and compatibility matching
//! - [`MatchOpt`] / [`search`] - selection of one entry from a manifest list
//!
//! ## Example
//!
//! ```rust
//! use iris_core::{search, Descriptor, MatchOpt, MediaType, Platform};
//!
//! let index = vec![
//!     Descriptor::new(MediaType::oci_manifest(), "sha256:a", 100)
//!         .with_platform(Platform::new("linux", "amd64")),
//!     Descriptor::new(MediaType::oci_manifest(), "sha256:b", 100)
//!         .with_platform(Platform::new("linux", "arm64")),
//! ];
//!
//! let opt = MatchOpt::new().with_platform("linux/arm64".parse().unwrap());
//! let selected = search(&index, &opt).unwrap();
//! assert_eq!(selected.digest, "sha256:b");
//! ```
//!
//! All types here are plain values: they hold no shared state and are safe to
//! use from any number of threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod descriptor;
pub mod digest;
pub mod error;
pub mod matcher;
pub mod mediatype;
pub mod platform;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use descriptor::Descriptor;
pub use digest::{Algorithm, Digest};
pub use error::{DataError, Error, Result};
pub use matcher::{search, MatchOpt};
pub use mediatype::MediaType;
pub use platform::Platform;
