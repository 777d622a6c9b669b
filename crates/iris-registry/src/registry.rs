//! The tag operations the sync engine needs from a registry.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RegistryError;
use crate::reference::Reference;

/// Lists and deletes tags in a repository.
///
/// Implementations check `cancel` and return [`RegistryError::Canceled`]
/// when it fires, so callers can tell cancellation apart from failures.
#[async_trait]
pub trait TagRegistry: Send + Sync {
    /// Returns every tag of the repository named by `repository`, in
    /// registry order. A missing repository has no tags.
    async fn list_tags(
        &self,
        repository: &Reference,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RegistryError>;

    /// Removes the tag named by `tag`. Other tags are never affected, even
    /// when they share the same manifest.
    async fn delete_tag(
        &self,
        tag: &Reference,
        cancel: &CancellationToken,
    ) -> Result<(), RegistryError>;
}

#[async_trait]
impl<T: TagRegistry + ?Sized> TagRegistry for Arc<T> {
    async fn list_tags(
        &self,
        repository: &Reference,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RegistryError> {
        (**self).list_tags(repository, cancel).await
    }

    async fn delete_tag(
        &self,
        tag: &Reference,
        cancel: &CancellationToken,
    ) -> Result<(), RegistryError> {
        (**self).delete_tag(tag, cancel).await
    }
}
