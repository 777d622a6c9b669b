//! Registry references.
//!
//! A reference names a repository and optionally a tag or digest:
//! `[registry[:port]/]repository[:tag][@digest]`. References without a
//! registry component resolve to Docker Hub, and single-component Docker Hub
//! repositories gain the `library/` prefix.

use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// Registry name used when a reference has none.
pub const DOCKER_HUB: &str = "docker.io";

/// API host serving Docker Hub.
const DOCKER_HUB_API: &str = "registry-1.docker.io";

const MAX_TAG_LEN: usize = 128;

/// A parsed registry reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Registry host, with optional port.
    pub registry: String,

    /// Repository path within the registry.
    pub repository: String,

    /// Tag, if any.
    pub tag: Option<String>,

    /// Digest, if any.
    pub digest: Option<String>,
}

impl Reference {
    /// Parses a reference string.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_registry::Reference;
    ///
    /// let r = Reference::parse("registry.example.com:5000/team/app:v1.2").unwrap();
    /// assert_eq!(r.registry, "registry.example.com:5000");
    /// assert_eq!(r.repository, "team/app");
    /// assert_eq!(r.tag.as_deref(), Some("v1.2"));
    ///
    /// let hub = Reference::parse("alpine").unwrap();
    /// assert_eq!(hub.common_name(), "docker.io/library/alpine");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] for empty, upper-case or
    /// otherwise malformed references.
    pub fn parse(input: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidReference {
            reference: input.to_string(),
            reason: reason.to_string(),
        };

        let input_trimmed = input.trim();
        if input_trimmed.is_empty() {
            return Err(invalid("reference is empty"));
        }

        let (rest, digest) = match input_trimmed.split_once('@') {
            Some((rest, digest)) => {
                if !digest.contains(':') {
                    return Err(invalid("digest must be <algorithm>:<hex>"));
                }
                (rest, Some(digest.to_string()))
            }
            None => (input_trimmed, None),
        };

        let (name, tag) = match rest.rfind(':') {
            Some(i) if !rest[i + 1..].contains('/') => (&rest[..i], Some(&rest[i + 1..])),
            _ => (rest, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, remainder))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_string(), remainder.to_string())
            }
            _ => (DOCKER_HUB.to_string(), name.to_string()),
        };

        let registry = if registry == "index.docker.io" {
            DOCKER_HUB.to_string()
        } else {
            registry
        };
        let repository = if registry == DOCKER_HUB && !repository.contains('/') {
            format!("library/{repository}")
        } else {
            repository
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("repository path has an empty component"));
        }
        if !repository.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'/' | b'.' | b'_' | b'-')
        }) {
            return Err(invalid("repository must be lowercase alphanumerics and separators"));
        }

        if let Some(tag) = tag {
            if !valid_tag(tag) {
                return Err(invalid("invalid tag"));
            }
        }

        Ok(Self {
            registry,
            repository,
            tag: tag.map(ToString::to_string),
            digest,
        })
    }

    /// Returns a copy pointing at `tag`, with any digest dropped.
    #[must_use]
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            registry: self.registry.clone(),
            repository: self.repository.clone(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    /// Returns `registry/repository` without tag or digest.
    #[must_use]
    pub fn repository_key(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    /// Returns the host serving the registry API.
    #[must_use]
    pub fn api_host(&self) -> &str {
        api_host_for(&self.registry)
    }

    /// Returns the full human-readable name.
    #[must_use]
    pub fn common_name(&self) -> String {
        let mut name = self.repository_key();
        if let Some(ref tag) = self.tag {
            name.push(':');
            name.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            name.push('@');
            name.push_str(digest);
        }
        name
    }
}

/// Maps a registry name to the host serving its API.
#[must_use]
pub fn api_host_for(registry: &str) -> &str {
    if registry == DOCKER_HUB {
        DOCKER_HUB_API
    } else {
        registry
    }
}

fn valid_tag(tag: &str) -> bool {
    let mut bytes = tag.bytes();
    let first_ok = bytes
        .next()
        .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_');
    first_ok
        && tag.len() <= MAX_TAG_LEN
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.common_name())
    }
}

impl FromStr for Reference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
