//! In-process registry.
//!
//! Holds repositories as ordered tag lists. Used for dry runs and tests;
//! deletions are recorded and individual tags can be made to fail.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RegistryError;
use crate::reference::Reference;
use crate::registry::TagRegistry;

#[derive(Debug, Default)]
struct State {
    repositories: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    deleted: Vec<String>,
}

/// A [`TagRegistry`] backed by memory.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a repository holding `tags` in the given order.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_registry::{MemoryRegistry, Reference};
    ///
    /// let repo = Reference::parse("registry.example.com/app").unwrap();
    /// let registry = MemoryRegistry::new().with_repository(&repo, ["v1", "v2"]);
    /// assert_eq!(registry.tags(&repo), vec!["v1", "v2"]);
    /// ```
    #[must_use]
    pub fn with_repository<I, S>(self, repository: &Reference, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .repositories
            .insert(repository.repository_key(), tags.into_iter().map(Into::into).collect());
        self
    }

    /// Makes every deletion of `tag` fail with an HTTP 500.
    #[must_use]
    pub fn fail_delete(self, tag: &Reference) -> Self {
        self.lock().failing.insert(tag.common_name());
        self
    }

    /// Returns the current tags of a repository.
    #[must_use]
    pub fn tags(&self, repository: &Reference) -> Vec<String> {
        self.lock()
            .repositories
            .get(&repository.repository_key())
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the full names of deleted tags, in deletion order.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TagRegistry for MemoryRegistry {
    async fn list_tags(
        &self,
        repository: &Reference,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Canceled);
        }
        Ok(self.tags(repository))
    }

    async fn delete_tag(
        &self,
        tag: &Reference,
        cancel: &CancellationToken,
    ) -> Result<(), RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Canceled);
        }
        let Some(name) = tag.tag.as_deref() else {
            return Err(RegistryError::InvalidReference {
                reference: tag.common_name(),
                reason: "tag required".to_string(),
            });
        };

        let full_name = tag.common_name();
        let mut state = self.lock();
        if state.failing.contains(&full_name) {
            return Err(RegistryError::HttpError {
                status: 500,
                message: format!("injected failure for {full_name}"),
            });
        }

        let tags = state
            .repositories
            .get_mut(&tag.repository_key())
            .ok_or_else(|| RegistryError::TagNotFound {
                reference: full_name.clone(),
            })?;
        let Some(position) = tags.iter().position(|t| t == name) else {
            return Err(RegistryError::TagNotFound {
                reference: full_name,
            });
        };
        tags.remove(position);
        state.deleted.push(full_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Reference {
        Reference::parse("registry.example.com/mirror/app").unwrap()
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let registry = MemoryRegistry::new().with_repository(&repo(), ["a", "b", "c"]);
        let cancel = CancellationToken::new();

        assert_eq!(registry.list_tags(&repo(), &cancel).await.unwrap(), ["a", "b", "c"]);
        registry.delete_tag(&repo().with_tag("b"), &cancel).await.unwrap();

        assert_eq!(registry.tags(&repo()), ["a", "c"]);
        assert_eq!(registry.deleted(), ["registry.example.com/mirror/app:b"]);
    }

    #[tokio::test]
    async fn test_missing_repository_lists_empty() {
        let registry = MemoryRegistry::new();
        let tags = registry
            .list_tags(&repo(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_tag() {
        let registry = MemoryRegistry::new().with_repository(&repo(), ["a"]);
        let err = registry
            .delete_tag(&repo().with_tag("zzz"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::TagNotFound { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure_keeps_tag() {
        let registry = MemoryRegistry::new()
            .with_repository(&repo(), ["a"])
            .fail_delete(&repo().with_tag("a"));
        let err = registry
            .delete_tag(&repo().with_tag("a"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::HttpError { status: 500, .. }));
        assert_eq!(registry.tags(&repo()), ["a"]);
        assert!(registry.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_canceled() {
        let registry = MemoryRegistry::new().with_repository(&repo(), ["a"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(registry.list_tags(&repo(), &cancel).await.unwrap_err().is_canceled());
        assert!(registry
            .delete_tag(&repo().with_tag("a"), &cancel)
            .await
            .unwrap_err()
            .is_canceled());
    }
}
