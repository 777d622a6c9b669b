//! Sync rules grouped by target.

use std::collections::HashMap;

use crate::config::{ConfigSync, SyncConfig};

/// Sync rules indexed by their literal target string.
///
/// Built once from configuration; the cleanup engine reads siblings from it
/// instead of rescanning the rule list per call.
#[derive(Debug, Clone, Default)]
pub struct SyncIndex {
    rules: Vec<ConfigSync>,
    by_target: HashMap<String, Vec<usize>>,
    order: Vec<String>,
}

impl SyncIndex {
    /// Indexes `rules`, preserving their order.
    #[must_use]
    pub fn new(rules: impl IntoIterator<Item = ConfigSync>) -> Self {
        let rules: Vec<ConfigSync> = rules.into_iter().collect();
        let mut by_target: HashMap<String, Vec<usize>> = HashMap::new();
        let mut order = Vec::new();

        for (i, rule) in rules.iter().enumerate() {
            let slot = by_target.entry(rule.target.clone()).or_insert_with(|| {
                order.push(rule.target.clone());
                Vec::new()
            });
            slot.push(i);
        }

        Self {
            rules,
            by_target,
            order,
        }
    }

    /// Indexes the rules of a configuration.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.sync.iter().cloned())
    }

    /// All rules in configuration order.
    #[must_use]
    pub fn rules(&self) -> &[ConfigSync] {
        &self.rules
    }

    /// Rules whose target is exactly `target`, in configuration order.
    #[must_use]
    pub fn siblings(&self, target: &str) -> Vec<&ConfigSync> {
        self.by_target
            .get(target)
            .map(|ids| ids.iter().map(|&i| &self.rules[i]).collect())
            .unwrap_or_default()
    }

    /// Siblings of `target` with `rule` guaranteed to be among them.
    ///
    /// A rule not present in the index is appended after the indexed ones.
    #[must_use]
    pub fn sibling_set<'a>(&'a self, rule: &'a ConfigSync, target: &str) -> Vec<&'a ConfigSync> {
        let mut siblings = self.siblings(target);
        if !siblings.iter().any(|s| *s == rule) {
            siblings.push(rule);
        }
        siblings
    }

    /// Distinct targets with cleanup enabled, each paired with the first
    /// rule that enables it.
    #[must_use]
    pub fn cleanup_targets(&self) -> Vec<(&str, &ConfigSync)> {
        self.order
            .iter()
            .filter_map(|target| {
                self.siblings(target)
                    .into_iter()
                    .find(|r| r.cleanup_tags)
                    .map(|rule| (target.as_str(), rule))
            })
            .collect()
    }

    /// Distinct targets in first-seen order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
