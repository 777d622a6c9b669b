//! Platform descriptions for manifest list entries.
//!
//! Two relations are provided:
//!
//! - [`Platform::matches`]: exact match after normalizing aliases and default variants
//! - [`Platform::compatible_with`]: the candidate can run on the wanted host
//!   (e.g. a `darwin` host runs `linux` images, an `amd64/v3` host runs `amd64/v2`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Operating system and CPU architecture an artifact applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// CPU architecture (e.g. `amd64`, `arm64`).
    pub architecture: String,

    /// Operating system (e.g. `linux`, `windows`).
    pub os: String,

    /// Operating system version, used by Windows images.
    #[serde(rename = "os.version", default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,

    /// Required operating system features.
    #[serde(rename = "os.features", default, skip_serializing_if = "Vec::is_empty")]
    pub os_features: Vec<String>,

    /// CPU variant (e.g. `v7` for `arm`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
}

impl Platform {
    /// Creates a platform from an OS and architecture.
    #[must_use]
    pub fn new(os: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            architecture: architecture.into(),
            ..Self::default()
        }
    }

    /// Sets the CPU variant.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Sets the OS version.
    #[must_use]
    pub fn with_os_version(mut self, os_version: impl Into<String>) -> Self {
        self.os_version = os_version.into();
        self
    }

    /// Returns a copy with architecture aliases and default variants resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_core::Platform;
    ///
    /// let p = Platform::new("linux", "aarch64").with_variant("v8").normalize();
    /// assert_eq!(p.to_string(), "linux/arm64");
    ///
    /// let p = Platform::new("linux", "arm").normalize();
    /// assert_eq!(p.to_string(), "linux/arm/v7");
    /// ```
    #[must_use]
    pub fn normalize(&self) -> Self {
        let mut p = self.clone();
        p.os = p.os.to_ascii_lowercase();
        p.architecture = p.architecture.to_ascii_lowercase();

        match p.architecture.as_str() {
            "x86_64" | "x86-64" => p.architecture = "amd64".to_string(),
            "aarch64" => p.architecture = "arm64".to_string(),
            "i386" | "i686" => p.architecture = "386".to_string(),
            "armhf" => {
                p.architecture = "arm".to_string();
                p.variant = "v7".to_string();
            }
            "armel" => {
                p.architecture = "arm".to_string();
                p.variant = "v6".to_string();
            }
            _ => {}
        }

        match (p.architecture.as_str(), p.variant.as_str()) {
            ("arm64", "v8") | ("amd64", "v1") => p.variant.clear(),
            ("arm", "") => p.variant = "v7".to_string(),
            _ => {}
        }

        p
    }

    /// Returns true when this platform is exactly the wanted one.
    #[must_use]
    pub fn matches(&self, want: &Self) -> bool {
        let (have, want) = (self.normalize(), want.normalize());
        have.os == want.os
            && have.architecture == want.architecture
            && have.variant == want.variant
            && os_version_agrees(&have, &want)
    }

    /// Returns true when content for this platform runs on the wanted host.
    ///
    /// Every exact match is also compatible.
    #[must_use]
    pub fn compatible_with(&self, want: &Self) -> bool {
        let (have, want) = (self.normalize(), want.normalize());

        let os_ok = have.os == want.os || (want.os == "darwin" && have.os == "linux");
        if !os_ok || !os_version_agrees(&have, &want) {
            return false;
        }

        if have.architecture == want.architecture {
            return match (variant_level(&have), variant_level(&want)) {
                (Some(h), Some(w)) => h <= w,
                _ => have.variant == want.variant || have.variant.is_empty(),
            };
        }

        match (want.architecture.as_str(), have.architecture.as_str()) {
            ("amd64", "386") => true,
            ("arm64", "arm") => variant_level(&have).is_some_and(|level| level <= 8),
            _ => false,
        }
    }
}

/// Ordered variant level for architectures with a linear variant scheme.
fn variant_level(p: &Platform) -> Option<u32> {
    match p.architecture.as_str() {
        "amd64" if p.variant.is_empty() => Some(1),
        "amd64" | "arm" => p.variant.strip_prefix('v')?.parse().ok(),
        _ => None,
    }
}

/// Windows images must agree on major.minor.build when both sides set it.
fn os_version_agrees(have: &Platform, want: &Platform) -> bool {
    if want.os != "windows" || have.os_version.is_empty() || want.os_version.is_empty() {
        return true;
    }
    let build = |v: &str| v.split('.').take(3).collect::<Vec<_>>().join(".");
    build(&have.os_version) == build(&want.os_version)
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if !self.variant.is_empty() {
            write!(f, "/{}", self.variant)?;
        }
        Ok(())
    }
}

impl FromStr for Platform {
    type Err = Error;

    /// Parses `os/arch[/variant][,osver=version]`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPlatform {
            platform: s.to_string(),
            reason: reason.to_string(),
        };

        let mut options = s.split(',');
        let spec = options.next().unwrap_or_default();
        let parts: Vec<&str> = spec.split('/').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("expected os/arch[/variant]"));
        }

        let mut platform = Self::new(parts[0], parts[1]);
        if let Some(variant) = parts.get(2) {
            platform.variant = (*variant).to_string();
        }

        for option in options {
            match option.split_once('=') {
                Some(("osver", version)) => platform.os_version = version.to_string(),
                _ => return Err(invalid("unknown option")),
            }
        }

        Ok(platform)
    }
}
