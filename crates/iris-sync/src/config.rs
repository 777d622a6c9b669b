//! Sync configuration.
//!
//! A YAML document with registry credentials and a list of sync rules:
//!
//! ```yaml
//! version: 1
//! creds:
//!   - registry: registry.example.com
//!     user: alice
//!     pass: secret
//! sync:
//!   - source: docker.io/library/alpine
//!     target: registry.example.com/mirror/alpine
//!     type: repository
//!     tags:
//!       allow: ["^3\\."]
//!     cleanupTags: true
//!     cleanupTagsExclude: ["^keep-"]
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use iris_registry::{Reference, RegistryAuth, RegistryConfig, TlsMode};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Only supported configuration version.
pub const CONFIG_VERSION: u32 = 1;

/// One group of tag filters.
///
/// A tag passes when it matches some `allow` pattern (or `allow` is empty),
/// matches no `deny` pattern, and, when `semver_range` is set, parses as a
/// semantic version inside the range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFilterSet {
    /// Regex patterns a tag must match one of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    /// Regex patterns a tag must not match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,

    /// Semantic version requirement, with `||` separating alternatives.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub semver_range: String,
}

impl TagFilterSet {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allow pattern.
    #[must_use]
    pub fn with_allow(mut self, pattern: impl Into<String>) -> Self {
        self.allow.push(pattern.into());
        self
    }

    /// Adds a deny pattern.
    #[must_use]
    pub fn with_deny(mut self, pattern: impl Into<String>) -> Self {
        self.deny.push(pattern.into());
        self
    }

    /// Sets the semver range.
    #[must_use]
    pub fn with_semver_range(mut self, range: impl Into<String>) -> Self {
        self.semver_range = range.into();
        self
    }

    /// Returns true when the set constrains nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty() && self.semver_range.is_empty()
    }
}

/// Whether a rule mirrors a whole repository or a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    /// Every tag selected by the filters.
    #[default]
    Repository,
    /// One tagged image.
    Image,
}

/// A sync rule: copy from `source` to `target`, optionally cleaning the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSync {
    /// Source repository or image.
    pub source: String,

    /// Target repository or image. Rules sharing this string are siblings.
    pub target: String,

    /// Kind of rule.
    #[serde(rename = "type", default)]
    pub sync_type: SyncType,

    /// Top-level tag filter.
    #[serde(default, skip_serializing_if = "TagFilterSet::is_empty")]
    pub tags: TagFilterSet,

    /// Additional filter sets; a tag wanted by any set is wanted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_sets: Vec<TagFilterSet>,

    /// Delete target tags no sibling rule wants.
    #[serde(default)]
    pub cleanup_tags: bool,

    /// Regex patterns protecting tags from cleanup.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup_tags_exclude: Vec<String>,
}

impl ConfigSync {
    /// Creates a repository rule with no filters.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_sync::{ConfigSync, TagFilterSet};
    ///
    /// let rule = ConfigSync::new("docker.io/library/alpine", "registry.example.com/alpine")
    ///     .with_tags(TagFilterSet::new().with_allow("^3\\."))
    ///     .with_cleanup(true);
    /// assert_eq!(rule.filter_sets().len(), 1);
    /// ```
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            sync_type: SyncType::Repository,
            tags: TagFilterSet::default(),
            tag_sets: Vec::new(),
            cleanup_tags: false,
            cleanup_tags_exclude: Vec::new(),
        }
    }

    /// Sets the rule type.
    #[must_use]
    pub const fn with_type(mut self, sync_type: SyncType) -> Self {
        self.sync_type = sync_type;
        self
    }

    /// Sets the top-level tag filter.
    #[must_use]
    pub fn with_tags(mut self, tags: TagFilterSet) -> Self {
        self.tags = tags;
        self
    }

    /// Adds a filter set.
    #[must_use]
    pub fn with_tag_set(mut self, set: TagFilterSet) -> Self {
        self.tag_sets.push(set);
        self
    }

    /// Enables or disables cleanup.
    #[must_use]
    pub const fn with_cleanup(mut self, enabled: bool) -> Self {
        self.cleanup_tags = enabled;
        self
    }

    /// Adds a cleanup exclusion pattern.
    #[must_use]
    pub fn with_cleanup_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.cleanup_tags_exclude.push(pattern.into());
        self
    }

    /// Returns the rule's effective filter sets: the explicit `tag_sets`,
    /// then the top-level `tags` when it constrains anything.
    #[must_use]
    pub fn filter_sets(&self) -> Vec<&TagFilterSet> {
        let mut sets: Vec<&TagFilterSet> = self.tag_sets.iter().collect();
        if !self.tags.is_empty() {
            sets.push(&self.tags);
        }
        sets
    }
}

/// Credentials and connection settings for one registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredsEntry {
    /// Registry host, e.g. `registry.example.com:5000` or `docker.io`.
    pub registry: String,

    /// Username for basic auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password for basic auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,

    /// Static bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// TLS mode.
    #[serde(default)]
    pub tls: TlsMode,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl CredsEntry {
    /// Converts the entry into client settings.
    #[must_use]
    pub fn to_registry_config(&self) -> RegistryConfig {
        let auth = match (&self.user, &self.pass, &self.token) {
            (_, _, Some(token)) => RegistryAuth::bearer(token.clone()),
            (Some(user), pass, None) => {
                RegistryAuth::basic(user.clone(), pass.clone().unwrap_or_default())
            }
            (None, _, None) => RegistryAuth::None,
        };

        let mut config = RegistryConfig::new(self.registry.clone())
            .with_tls(self.tls)
            .with_auth(auth);
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// A full sync configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Configuration format version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Per-registry credentials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creds: Vec<CredsEntry>,

    /// Sync rules.
    #[serde(default)]
    pub sync: Vec<ConfigSync>,
}

impl SyncConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or validated.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Yaml { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for semantic errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if let Some(version) = self.version {
            if version != CONFIG_VERSION {
                return invalid(format!("unsupported version {version}"));
            }
        }

        for (i, creds) in self.creds.iter().enumerate() {
            if creds.registry.is_empty() {
                return invalid(format!("creds[{i}]: registry is required"));
            }
            if creds.token.is_some() && (creds.user.is_some() || creds.pass.is_some()) {
                return invalid(format!(
                    "creds[{i}] ({}): token cannot be combined with user/pass",
                    creds.registry
                ));
            }
            if creds.pass.is_some() && creds.user.is_none() {
                return invalid(format!("creds[{i}] ({}): pass requires user", creds.registry));
            }
        }

        if self.sync.is_empty() {
            return invalid("at least one sync rule is required".to_string());
        }

        for (i, rule) in self.sync.iter().enumerate() {
            if rule.source.is_empty() {
                return invalid(format!("sync[{i}]: source is required"));
            }
            if rule.target.is_empty() {
                return invalid(format!("sync[{i}]: target is required"));
            }
            if let Err(e) = Reference::parse(&rule.target) {
                return invalid(format!("sync[{i}]: {e}"));
            }
            if rule.cleanup_tags && rule.sync_type != SyncType::Repository {
                return invalid(format!(
                    "sync[{i}] ({}): cleanupTags requires type repository",
                    rule.target
                ));
            }
        }

        Ok(())
    }

    /// Returns client settings for every configured registry.
    #[must_use]
    pub fn registry_configs(&self) -> Vec<RegistryConfig> {
        self.creds.iter().map(CredsEntry::to_registry_config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
version: 1
creds:
  - registry: registry.example.com
    user: alice
    pass: secret
    timeout: 10
  - registry: localhost:5000
    tls: disabled
sync:
  - source: docker.io/library/alpine
    target: registry.example.com/mirror/alpine
    type: repository
    tags:
      allow: ["^3\\."]
      deny: ["rc"]
      semverRange: ">=3.18"
    tagSets:
      - allow: ["^latest$"]
    cleanupTags: true
    cleanupTagsExclude: ["^keep-"]
  - source: docker.io/library/alpine:edge
    target: registry.example.com/mirror/alpine:edge
    type: image
"#;

    #[test]
    fn test_parse_example() {
        let config = SyncConfig::from_yaml(EXAMPLE).unwrap();
        assert_eq!(config.version, Some(1));
        assert_eq!(config.sync.len(), 2);

        let rule = &config.sync[0];
        assert_eq!(rule.sync_type, SyncType::Repository);
        assert_eq!(rule.tags.allow, ["^3\\."]);
        assert_eq!(rule.tags.semver_range, ">=3.18");
        assert_eq!(rule.tag_sets.len(), 1);
        assert!(rule.cleanup_tags);
        assert_eq!(rule.cleanup_tags_exclude, ["^keep-"]);

        assert_eq!(config.sync[1].sync_type, SyncType::Image);
        assert!(!config.sync[1].cleanup_tags);
    }

    #[test]
    fn test_filter_sets_order() {
        let rule = ConfigSync::new("a", "registry.example.com/b")
            .with_tag_set(TagFilterSet::new().with_allow("^x$"))
            .with_tags(TagFilterSet::new().with_deny("^y$"));
        let sets = rule.filter_sets();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].allow, ["^x$"]);
        assert_eq!(sets[1].deny, ["^y$"]);
    }

    #[test]
    fn test_filter_sets_skip_empty_top_level() {
        let rule = ConfigSync::new("a", "registry.example.com/b");
        assert!(rule.filter_sets().is_empty());

        let semver_only = rule.with_tags(TagFilterSet::new().with_semver_range(">=1"));
        assert_eq!(semver_only.filter_sets().len(), 1);
    }

    #[test]
    fn test_creds_to_registry_config() {
        let config = SyncConfig::from_yaml(EXAMPLE).unwrap();
        let registries = config.registry_configs();

        assert_eq!(registries[0].host, "registry.example.com");
        assert_eq!(registries[0].auth, RegistryAuth::basic("alice", "secret"));
        assert_eq!(registries[0].timeout, Duration::from_secs(10));

        assert_eq!(registries[1].url, "http://localhost:5000");
        assert_eq!(registries[1].auth, RegistryAuth::None);
    }

    #[test]
    fn test_bearer_creds() {
        let creds = CredsEntry {
            registry: "registry.example.com".to_string(),
            token: Some("tok".to_string()),
            ..CredsEntry::default()
        };
        assert_eq!(creds.to_registry_config().auth, RegistryAuth::bearer("tok"));
    }

    #[test]
    fn test_validate_rejects() {
        let cases = [
            ("version: 2\nsync:\n  - {source: a, target: registry.example.com/b}\n", "unsupported version"),
            ("sync: []\n", "at least one sync rule"),
            ("sync:\n  - {source: '', target: registry.example.com/b}\n", "source is required"),
            ("sync:\n  - {source: a, target: 'Registry.Example.com/B'}\n", "sync[0]"),
            (
                "sync:\n  - {source: a, target: registry.example.com/b:v1, type: image, cleanupTags: true}\n",
                "cleanupTags requires type repository",
            ),
            (
                "creds:\n  - {registry: r.example.com, token: t, user: u}\nsync:\n  - {source: a, target: registry.example.com/b}\n",
                "token cannot be combined",
            ),
        ];

        for (yaml, expected) in cases {
            let err = SyncConfig::from_yaml(yaml).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { ref message } if message.contains(expected)),
                "{yaml:?}: expected {expected:?}, got {err}"
            );
        }
    }

    #[test]
    fn test_yaml_error() {
        let err = SyncConfig::from_yaml("sync: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
