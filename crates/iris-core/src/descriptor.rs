//! OCI content descriptors.
//!
//! A descriptor describes the disposition of targeted content. It includes
//! the type of the content, a content identifier (digest), and the byte-size
//! of the raw content.
//!
//! Two comparisons are defined:
//!
//! - **equal** (`==`): every field is identical, with annotations and urls
//!   compared as unordered sets.
//! - **same** ([`Descriptor::same`]): identical digest and size, i.e. the same
//!   bytes, whatever media type or metadata wraps them.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::digest::{Algorithm, Digest};
use crate::error::{DataError, Result};
use crate::mediatype::MediaType;
use crate::platform::Platform;

/// OCI content descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    #[serde(default, skip_serializing_if = "MediaType::is_empty")]
    pub media_type: MediaType,

    /// Digest of the targeted content, in `<algorithm>:<hex>` form.
    ///
    /// Kept as received; use [`Descriptor::digest`] to validate it.
    #[serde(default)]
    pub digest: String,

    /// Size in bytes of the content.
    #[serde(default)]
    pub size: u64,

    /// Optional URLs for alternative locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,

    /// Optional annotations (key-value metadata).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,

    /// Optional inline copy of the content.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_data")]
    pub data: Option<Vec<u8>>,

    /// Platform the content applies to, set on manifest list entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Artifact type of an artifact manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    #[serde(skip)]
    digest_algo: Option<Algorithm>,
}

impl Descriptor {
    /// Creates a new descriptor.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_core::{Descriptor, MediaType};
    ///
    /// let desc = Descriptor::new(
    ///     MediaType::oci_manifest(),
    ///     "sha256:44752f37272e944fd2c913a35342eaccdd1aaf189bae50676b301ab213fc5061",
    ///     12,
    /// );
    /// assert!(desc.digest().is_ok());
    /// ```
    #[must_use]
    pub fn new(media_type: MediaType, digest: impl Into<String>, size: u64) -> Self {
        Self {
            media_type,
            digest: digest.into(),
            size,
            ..Self::default()
        }
    }

    /// Creates a descriptor that embeds `data`, computing its digest and size.
    #[must_use]
    pub fn from_data(media_type: MediaType, algorithm: Algorithm, data: &[u8]) -> Self {
        Self {
            media_type,
            digest: algorithm.digest(data).to_string(),
            size: data.len() as u64,
            data: Some(data.to_vec()),
            digest_algo: Some(algorithm),
            ..Self::default()
        }
    }

    /// Adds an annotation to the descriptor.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds an alternate fetch location.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.urls.get_or_insert_with(Vec::new).push(url.into());
        self
    }

    /// Sets the platform.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets the artifact type.
    #[must_use]
    pub fn with_artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    /// Sets the inline data without touching digest or size.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Parses and validates the digest.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDigest`] if the digest is malformed.
    pub fn digest(&self) -> Result<Digest> {
        Digest::parse(&self.digest)
    }

    /// Returns the annotation value for `key`, if any.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.as_ref()?.get(key).map(String::as_str)
    }

    /// Full equality across every field.
    #[must_use]
    pub fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// Content identity: same digest and size.
    ///
    /// Media type, annotations, urls, platform and artifact type are ignored,
    /// so a Docker and an OCI wrapper around identical bytes are the same.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        self.digest == other.digest && self.size == other.size
    }

    /// Returns the algorithm of the digest, or the preferred/canonical
    /// algorithm when the digest is empty or invalid.
    #[must_use]
    pub fn digest_algo(&self) -> Algorithm {
        Digest::parse(&self.digest)
            .map(|d| d.algorithm())
            .ok()
            .or(self.digest_algo)
            .unwrap_or(Algorithm::CANONICAL)
    }

    /// Sets the algorithm used when the digest is empty or invalid.
    ///
    /// A valid digest always wins over the preference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedAlgorithm`] if `algorithm` is not registered.
    pub fn digest_algo_prefer(&mut self, algorithm: &str) -> Result<()> {
        self.digest_algo = Some(algorithm.parse()?);
        Ok(())
    }

    /// Returns the inline data after verifying size and digest.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ParsingFailed`] when the data is missing, its
    /// length differs from `size`, or it does not hash to `digest`.
    pub fn get_data(&self) -> Result<&[u8]> {
        let data = self.data.as_deref().ok_or(DataError::MissingData)?;

        let actual = data.len() as u64;
        if actual != self.size {
            return Err(DataError::SizeMismatch {
                expected: self.size,
                actual,
            }
            .into());
        }

        let computed = self.digest_algo().digest(data).to_string();
        if computed != self.digest {
            return Err(DataError::DigestMismatch {
                expected: self.digest.clone(),
                actual: computed,
            }
            .into());
        }

        Ok(data)
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.media_type == other.media_type
            && self.digest == other.digest
            && self.size == other.size
            && url_set(self.urls.as_ref()) == url_set(other.urls.as_ref())
            && self.annotations == other.annotations
            && self.data == other.data
            && self.platform == other.platform
            && self.artifact_type == other.artifact_type
    }
}

impl Eq for Descriptor {}

fn url_set(urls: Option<&Vec<String>>) -> Option<BTreeSet<&str>> {
    urls.map(|u| u.iter().map(String::as_str).collect())
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
