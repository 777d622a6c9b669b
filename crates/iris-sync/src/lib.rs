//! # Iris Sync
//!
//! Tag filters and the cleanup engine for sync targets.
//!
//! Several sync rules may mirror into the same target repository. Cleanup
//! treats those rules as one sibling set: a tag survives if any sibling's
//! filters want it or any sibling's exclusion patterns protect it.
//!
//! ## Quick Start
//!
//! ```rust
//! use iris_registry::{MemoryRegistry, Reference};
//! use iris_sync::{ConfigSync, SyncIndex, TagCleaner, TagFilterSet};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let target = "registry.example.com/mirror/app";
//! let stable = ConfigSync::new("docker.io/team/app", target)
//!     .with_tags(TagFilterSet::new().with_allow("^stable$"))
//!     .with_cleanup(true);
//! let latest = ConfigSync::new("ghcr.io/team/app", target)
//!     .with_tags(TagFilterSet::new().with_allow("^latest$"));
//!
//! let registry = MemoryRegistry::new()
//!     .with_repository(&Reference::parse(target)?, ["stable", "latest", "old"]);
//! let cleaner = TagCleaner::new(registry, SyncIndex::new([stable.clone(), latest]));
//!
//! let summary = cleaner.cleanup_tags(&stable, target, &CancellationToken::new()).await?;
//! assert_eq!(summary.deleted, ["old"]);
//! # Ok(())
//! # }
//! ```

mod cleanup;
mod config;
mod error;
mod filter;
mod index;
mod version;

pub use cleanup::{CleanupPlan, CleanupSummary, TagCleaner};
pub use config::{ConfigSync, CredsEntry, SyncConfig, SyncType, TagFilterSet, CONFIG_VERSION};
pub use error::{CleanupError, ConfigError, DeletionFailure, DeletionFailures, FilterError};
pub use filter::{compile_pattern, filter_tag_list, ExclusionList, TagFilter};
pub use index::SyncIndex;
pub use version::{parse_tag_version, SemverRange};
