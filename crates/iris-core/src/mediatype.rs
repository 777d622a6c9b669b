//! Media types for registry content.

use serde::{Deserialize, Serialize};

/// Media type classifying the content a descriptor points at.
///
/// An empty media type is the unset value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaType(String);

impl MediaType {
    /// Docker schema2 image manifest.
    pub const DOCKER2_MANIFEST: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker schema2 manifest list.
    pub const DOCKER2_MANIFEST_LIST: &'static str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Docker gzip compressed layer.
    pub const DOCKER2_LAYER_GZIP: &'static str =
        "application/vnd.docker.image.rootfs.diff.tar.gzip";

    /// OCI image manifest.
    pub const OCI1_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index.
    pub const OCI1_INDEX: &'static str = "application/vnd.oci.image.index.v1+json";

    /// OCI gzip compressed layer.
    pub const OCI1_LAYER_GZIP: &'static str = "application/vnd.oci.image.layer.v1.tar+gzip";

    /// OCI empty JSON blob (`{}`), used as a placeholder config.
    pub const OCI1_EMPTY: &'static str = "application/vnd.oci.empty.v1+json";

    /// Creates a new media type.
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self(media_type.into())
    }

    /// Returns the media type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when no media type is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true for manifest list / index media types.
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::DOCKER2_MANIFEST_LIST | Self::OCI1_INDEX
        )
    }

    /// Creates the OCI image manifest media type.
    #[must_use]
    pub fn oci_manifest() -> Self {
        Self::new(Self::OCI1_MANIFEST)
    }

    /// Creates the OCI image index media type.
    #[must_use]
    pub fn oci_index() -> Self {
        Self::new(Self::OCI1_INDEX)
    }

    /// Creates the OCI empty JSON media type.
    #[must_use]
    pub fn oci_empty() -> Self {
        Self::new(Self::OCI1_EMPTY)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}
