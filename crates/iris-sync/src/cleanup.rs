//! Target cleanup across sibling sync rules.
//!
//! Rules that share a target are evaluated together. A tag is deleted only
//! when no sibling rule wants it and no sibling's exclusion pattern protects
//! it; a rule that sets no filters wants every tag. Deletions run in listing
//! order, one at a time: cancellation is checked before each one, and a
//! failed deletion is recorded without stopping the rest.

use std::collections::HashSet;

use iris_registry::{Reference, TagRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ConfigSync;
use crate::error::{CleanupError, DeletionFailure, DeletionFailures};
use crate::filter::{filter_tag_list, ExclusionList};
use crate::index::SyncIndex;

/// What a cleanup run would do to one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    /// Target repository.
    pub target: String,
    /// Tags present, in listing order.
    pub tags: Vec<String>,
    /// Tags some sibling rule wants, in first-seen order.
    pub wanted: Vec<String>,
    /// Unwanted tags kept by an exclusion, with the first matching pattern.
    pub excluded: Vec<(String, String)>,
    /// Tags scheduled for deletion, in listing order.
    pub delete: Vec<String>,
}

impl CleanupPlan {
    /// Returns true when nothing would be deleted.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.delete.is_empty()
    }
}

/// Outcome of a successful cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Target repository.
    pub target: String,
    /// Tags deleted, in deletion order.
    pub deleted: Vec<String>,
    /// Tags left in place, in listing order.
    pub retained: Vec<String>,
}

/// Deletes tags that no sibling sync rule wants.
#[derive(Debug)]
pub struct TagCleaner<R> {
    registry: R,
    index: SyncIndex,
}

impl<R: TagRegistry> TagCleaner<R> {
    /// Creates a cleaner over `registry` using the sibling rules in `index`.
    pub const fn new(registry: R, index: SyncIndex) -> Self {
        Self { registry, index }
    }

    /// The rule index.
    pub const fn index(&self) -> &SyncIndex {
        &self.index
    }

    /// The registry.
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Classifies `tags` for `target` without touching the registry.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::Filter`] or [`CleanupError::ExclusionPattern`]
    /// when a sibling rule carries a pattern that does not compile.
    pub fn plan(
        &self,
        rule: &ConfigSync,
        target: &str,
        tags: &[String],
    ) -> Result<CleanupPlan, CleanupError> {
        let siblings = self.index.sibling_set(rule, target);
        if siblings.len() > 1 {
            debug!(
                repository = target,
                count = siblings.len(),
                "Multiple sync entries found for target"
            );
        }

        let wanted = wanted_tags(&siblings, target, tags)?;

        let exclusions = ExclusionList::compile(
            siblings
                .iter()
                .flat_map(|s| s.cleanup_tags_exclude.iter().map(String::as_str)),
        )
        .map_err(|source| CleanupError::ExclusionPattern {
            target: target.to_string(),
            source,
        })?;

        let wanted_set: HashSet<&str> = wanted.iter().map(String::as_str).collect();
        let mut excluded = Vec::new();
        let mut delete = Vec::new();
        for tag in tags {
            if wanted_set.contains(tag.as_str()) {
                continue;
            }
            if let Some(pattern) = exclusions.first_match(tag) {
                debug!(repository = target, tag = %tag, pattern, "Tag excluded from cleanup");
                excluded.push((tag.clone(), pattern.to_string()));
                continue;
            }
            delete.push(tag.clone());
        }

        Ok(CleanupPlan {
            target: target.to_string(),
            tags: tags.to_vec(),
            wanted,
            excluded,
            delete,
        })
    }

    /// Lists the target's tags and plans a cleanup without deleting anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid, its tags cannot be listed,
    /// or a pattern does not compile.
    pub async fn dry_run(
        &self,
        rule: &ConfigSync,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<CleanupPlan, CleanupError> {
        let repository = parse_target(target)?;
        let tags = self.list_tags(&repository, cancel).await?;
        self.plan(rule, target, &tags)
    }

    /// Deletes every tag of `target` that no sibling of `rule` wants.
    ///
    /// # Errors
    ///
    /// Fails before any deletion if the target is invalid, its tags cannot be
    /// listed, or a pattern does not compile. Otherwise returns
    /// [`CleanupError::Deletions`] carrying every per-tag failure, plus a
    /// cancellation marker when `cancel` fired; deletions already made stand.
    pub async fn cleanup_tags(
        &self,
        rule: &ConfigSync,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<CleanupSummary, CleanupError> {
        let repository = parse_target(target)?;
        let tags = self.list_tags(&repository, cancel).await?;
        let plan = self.plan(rule, target, &tags)?;
        let name = repository.common_name();

        let mut failures = DeletionFailures::new(name.clone());
        for (i, tag) in plan.delete.iter().enumerate() {
            if cancel.is_cancelled() {
                failures.push(DeletionFailure::Canceled {
                    remaining: plan.delete[i..].to_vec(),
                });
                break;
            }

            info!(repository = %name, tag = %tag, "Deleting tag");
            match self.registry.delete_tag(&repository.with_tag(tag), cancel).await {
                Ok(()) => {
                    debug!(repository = %name, tag = %tag, "Deleted tag");
                    failures.record_deleted(tag.clone());
                }
                Err(e) if e.is_canceled() => {
                    failures.push(DeletionFailure::Canceled {
                        remaining: plan.delete[i..].to_vec(),
                    });
                    break;
                }
                Err(e) => {
                    error!(repository = %name, tag = %tag, error = %e, "Failed to delete tag");
                    failures.push(DeletionFailure::Tag {
                        target: name.clone(),
                        tag: tag.clone(),
                        source: e,
                    });
                }
            }
        }

        if plan.delete.is_empty() {
            debug!(repository = %name, "No tags require cleanup");
        }

        if !failures.is_empty() {
            return Err(CleanupError::Deletions(failures));
        }

        let deleted = failures.deleted().to_vec();
        let gone: HashSet<&str> = deleted.iter().map(String::as_str).collect();
        let retained = plan
            .tags
            .iter()
            .filter(|t| !gone.contains(t.as_str()))
            .cloned()
            .collect();

        Ok(CleanupSummary {
            target: name,
            deleted,
            retained,
        })
    }

    async fn list_tags(
        &self,
        repository: &Reference,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, CleanupError> {
        self.registry
            .list_tags(repository, cancel)
            .await
            .map_err(|source| {
                error!(repository = %repository, error = %source, "Failed getting target tags for cleanup");
                CleanupError::ListTags {
                    target: repository.common_name(),
                    source,
                }
            })
    }
}

/// Parses a target into a repository reference without tag or digest.
fn parse_target(target: &str) -> Result<Reference, CleanupError> {
    let mut repository = Reference::parse(target).map_err(|source| {
        error!(repository = target, error = %source, "Failed parsing target for cleanup");
        CleanupError::InvalidTarget {
            target: target.to_string(),
            source,
        }
    })?;
    repository.tag = None;
    repository.digest = None;
    Ok(repository)
}

/// Unions the tags every sibling's filter sets keep.
///
/// When no sibling has any filter set, every tag is wanted.
fn wanted_tags(
    siblings: &[&ConfigSync],
    target: &str,
    tags: &[String],
) -> Result<Vec<String>, CleanupError> {
    let mut wanted = Vec::new();
    let mut seen = HashSet::new();
    let mut any_filters = false;

    for sibling in siblings {
        for set in sibling.filter_sets() {
            any_filters = true;
            let kept = filter_tag_list(set, tags).map_err(|source| {
                error!(
                    repository = target,
                    allow = ?set.allow,
                    deny = ?set.deny,
                    semver_range = %set.semver_range,
                    error = %source,
                    "Failed processing tag filters for cleanup"
                );
                CleanupError::Filter {
                    target: target.to_string(),
                    source,
                }
            })?;
            for tag in kept {
                if seen.insert(tag.clone()) {
                    wanted.push(tag);
                }
            }
        }
    }

    if !any_filters {
        return Ok(tags.to_vec());
    }
    Ok(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TagFilterSet;
    use iris_registry::MemoryRegistry;

    const TARGET: &str = "registry.example.com/mirror/app";

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn cleaner(rules: Vec<ConfigSync>) -> TagCleaner<MemoryRegistry> {
        TagCleaner::new(MemoryRegistry::new(), SyncIndex::new(rules))
    }

    #[test]
    fn test_plan_union_of_siblings() {
        let a = ConfigSync::new("src/a", TARGET)
            .with_tags(TagFilterSet::new().with_allow("^stable$"))
            .with_cleanup(true);
        let b = ConfigSync::new("src/b", TARGET).with_tags(TagFilterSet::new().with_allow("^latest$"));
        let cleaner = cleaner(vec![a.clone(), b]);

        let plan = cleaner
            .plan(&a, TARGET, &tags(&["stable", "latest", "old"]))
            .unwrap();
        assert_eq!(plan.wanted, ["stable", "latest"]);
        assert_eq!(plan.delete, ["old"]);
        assert!(plan.excluded.is_empty());
    }

    #[test]
    fn test_plan_no_filters_wants_everything() {
        let rule = ConfigSync::new("src/a", TARGET).with_cleanup(true);
        let cleaner = cleaner(vec![rule.clone()]);
        let plan = cleaner.plan(&rule, TARGET, &tags(&["a", "b"])).unwrap();
        assert_eq!(plan.wanted, ["a", "b"]);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_plan_unfiltered_sibling_does_not_protect_all() {
        // One sibling without filters imposes nothing; the filtered sibling decides.
        let a = ConfigSync::new("src/a", TARGET).with_cleanup(true);
        let b = ConfigSync::new("src/b", TARGET).with_tags(TagFilterSet::new().with_allow("^v1"));
        let cleaner = cleaner(vec![a.clone(), b]);
        let plan = cleaner.plan(&a, TARGET, &tags(&["v1.0", "v2.0"])).unwrap();
        assert_eq!(plan.delete, ["v2.0"]);
    }

    #[test]
    fn test_plan_tag_sets_and_top_level_union() {
        let rule = ConfigSync::new("src/a", TARGET)
            .with_tag_set(TagFilterSet::new().with_allow("^latest$"))
            .with_tags(TagFilterSet::new().with_semver_range(">=2"));
        let cleaner = cleaner(vec![rule.clone()]);
        let plan = cleaner
            .plan(&rule, TARGET, &tags(&["1.9", "2.1", "latest", "edge"]))
            .unwrap();
        assert_eq!(plan.wanted, ["latest", "2.1"]);
        assert_eq!(plan.delete, ["1.9", "edge"]);
    }

    #[test]
    fn test_plan_exclusions_pooled_first_match() {
        let a = ConfigSync::new("src/a", TARGET)
            .with_tags(TagFilterSet::new().with_allow("^v"))
            .with_cleanup_exclude("^keep-");
        let b = ConfigSync::new("src/b", TARGET).with_cleanup_exclude("keep");
        let cleaner = cleaner(vec![a.clone(), b]);
        let plan = cleaner
            .plan(&a, TARGET, &tags(&["v1", "keep-1", "xkeep", "junk"]))
            .unwrap();
        assert_eq!(
            plan.excluded,
            [
                ("keep-1".to_string(), "^keep-".to_string()),
                ("xkeep".to_string(), "keep".to_string()),
            ]
        );
        assert_eq!(plan.delete, ["junk"]);
    }

    #[test]
    fn test_plan_invalid_exclusion_aborts() {
        let rule = ConfigSync::new("src/a", TARGET).with_cleanup_exclude("(");
        let cleaner = cleaner(vec![rule.clone()]);
        let err = cleaner.plan(&rule, TARGET, &tags(&["a"])).unwrap_err();
        assert!(matches!(err, CleanupError::ExclusionPattern { ref source, .. } if source.pattern() == "("));
    }

    #[test]
    fn test_plan_invalid_filter_in_sibling_aborts() {
        let a = ConfigSync::new("src/a", TARGET).with_tags(TagFilterSet::new().with_allow("^ok$"));
        let b = ConfigSync::new("src/b", TARGET).with_tags(TagFilterSet::new().with_deny("[x"));
        let cleaner = cleaner(vec![a.clone(), b]);
        let err = cleaner.plan(&a, TARGET, &tags(&["ok"])).unwrap_err();
        assert!(matches!(err, CleanupError::Filter { .. }));
    }

    #[tokio::test]
    async fn test_invalid_target() {
        let rule = ConfigSync::new("src/a", "Not A Reference");
        let cleaner = cleaner(vec![rule.clone()]);
        let err = cleaner
            .cleanup_tags(&rule, "Not A Reference", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CleanupError::InvalidTarget { .. }));
    }

    #[test]
    fn test_wanted_dedup_preserves_first_seen() {
        let a = ConfigSync::new("src/a", TARGET)
            .with_tag_set(TagFilterSet::new().with_allow("b"))
            .with_tag_set(TagFilterSet::new().with_allow("a|b"));
        let cleaner = cleaner(vec![a.clone()]);
        let plan = cleaner.plan(&a, TARGET, &tags(&["a", "b", "c"])).unwrap();
        assert_eq!(plan.wanted, ["b", "a"]);
        assert_eq!(plan.delete, ["c"]);
    }
}
