//! # Iris Registry
//!
//! Registry access for Iris: references, per-host connection settings, and
//! the tag operations the sync engine runs against OCI-compatible
//! registries (Docker Registry, Harbor, Docker Hub, etc.).
//!
//! ## Features
//!
//! - **Tag listing**: paginated `/v2/<name>/tags/list` with `Link` headers
//! - **Safe tag deletion**: falls back to a placeholder manifest when the
//!   registry refuses `DELETE` by tag, so shared manifests survive
//! - **Cooperative cancellation**: every request races a `CancellationToken`
//! - **In-memory registry**: for dry runs and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iris_registry::{OciClient, Reference, RegistryAuth, RegistryConfig, TagRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OciClient::new().with_config(
//!         RegistryConfig::new("registry.example.com").with_auth(RegistryAuth::basic("user", "pass")),
//!     );
//!
//!     let repo = Reference::parse("registry.example.com/mirror/alpine")?;
//!     let tags = client.list_tags(&repo, &CancellationToken::new()).await?;
//!     println!("{tags:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              TagRegistry (trait)              │
//! │   ┌──────────────────┐  ┌─────────────────┐   │
//! │   │    OciClient     │  │ MemoryRegistry  │   │
//! │   │  (HTTP, per host)│  │   (in-process)  │   │
//! │   └──────────────────┘  └─────────────────┘   │
//! └──────────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌──────────────────────────────────────────────┐
//! │                OCI Registry                   │
//! └──────────────────────────────────────────────┘
//! ```

mod client;
mod config;
mod error;
mod memory;
mod oci;
mod reference;
mod registry;

pub use client::OciClient;
pub use config::{RegistryAuth, RegistryConfig, TlsMode, DEFAULT_TIMEOUT};
pub use error::RegistryError;
pub use memory::MemoryRegistry;
pub use oci::{
    empty_config, ErrorResponse, Index, Manifest, RegistryApiError, TagList, ANNOTATION_CREATED,
    ANNOTATION_REF_NAME,
};
pub use reference::{api_host_for, Reference, DOCKER_HUB};
pub use registry::TagRegistry;
