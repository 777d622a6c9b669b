//! OCI Distribution Specification types.
//!
//! Wire formats for image manifests, manifest lists and the tag listing
//! endpoint. Content descriptors are the shared [`iris_core::Descriptor`].

use std::collections::HashMap;

use iris_core::{search, Algorithm, Descriptor, MatchOpt, MediaType};
use serde::{Deserialize, Serialize};

/// Annotation recording when content was created.
pub const ANNOTATION_CREATED: &str = "org.opencontainers.image.created";

/// Annotation carrying the tag a placeholder manifest was built for.
pub const ANNOTATION_REF_NAME: &str = "org.opencontainers.image.ref.name";

/// OCI Image Manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Media type of this manifest.
    #[serde(default, skip_serializing_if = "MediaType::is_empty")]
    pub media_type: MediaType,

    /// Configuration descriptor.
    pub config: Descriptor,

    /// Layers that make up the image or artifact.
    #[serde(default)]
    pub layers: Vec<Descriptor>,

    /// Optional annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,

    /// Optional artifact type (OCI 1.1+).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    /// Optional subject descriptor for the referrers API (OCI 1.1+).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
}

impl Manifest {
    /// Creates an OCI image manifest with the given config and layers.
    #[must_use]
    pub fn new(config: Descriptor, layers: Vec<Descriptor>) -> Self {
        Self {
            schema_version: 2,
            media_type: MediaType::oci_manifest(),
            config,
            layers,
            annotations: None,
            artifact_type: None,
            subject: None,
        }
    }

    /// Creates a throw-away manifest unique to `tag` and `created`.
    ///
    /// Registries that refuse deletion by tag can still drop a tag by first
    /// pointing it at this manifest and then deleting the manifest by digest.
    /// The annotations make its digest distinct from every real manifest.
    #[must_use]
    pub fn placeholder(tag: &str, created: &str) -> Self {
        Self::new(empty_config(), Vec::new())
            .with_annotation(ANNOTATION_REF_NAME, tag)
            .with_annotation(ANNOTATION_CREATED, created)
    }

    /// Adds an annotation to the manifest.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Serializes the manifest and returns its bytes with a descriptor for them.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_descriptor(&self) -> Result<(Vec<u8>, Descriptor), serde_json::Error> {
        let body = serde_json::to_vec(self)?;
        let digest = Algorithm::CANONICAL.digest(&body);
        let desc = Descriptor::new(self.media_type.clone(), digest.to_string(), body.len() as u64);
        Ok((body, desc))
    }
}

/// Descriptor for the `{}` config blob, with the blob inlined.
#[must_use]
pub fn empty_config() -> Descriptor {
    Descriptor::from_data(MediaType::oci_empty(), Algorithm::CANONICAL, b"{}")
}

/// OCI Image Index (manifest list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Media type of this index.
    #[serde(default, skip_serializing_if = "MediaType::is_empty")]
    pub media_type: MediaType,

    /// Entries of the list.
    #[serde(default)]
    pub manifests: Vec<Descriptor>,

    /// Optional annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl Index {
    /// Creates an OCI index over `manifests`.
    #[must_use]
    pub fn new(manifests: Vec<Descriptor>) -> Self {
        Self {
            schema_version: 2,
            media_type: MediaType::oci_index(),
            manifests,
            annotations: None,
        }
    }

    /// Selects the entry that best fits `opt`.
    ///
    /// # Errors
    ///
    /// Returns [`iris_core::Error::NotFound`] when no entry qualifies.
    pub fn select(&self, opt: &MatchOpt) -> iris_core::Result<&Descriptor> {
        search(&self.manifests, opt)
    }
}

/// Response from the `/v2/<name>/tags/list` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagList {
    /// Repository name.
    #[serde(default)]
    pub name: String,

    /// Tags on this page; registries send `null` for an empty repository.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Error body returned by registry API calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// List of errors.
    #[serde(default)]
    pub errors: Vec<RegistryApiError>,
}

impl ErrorResponse {
    /// Joins the error messages into one line.
    #[must_use]
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Individual error from registry API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryApiError {
    /// Error code.
    pub code: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Additional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::Platform;

    #[test]
    fn test_manifest_new() {
        let manifest = Manifest::new(empty_config(), Vec::new());
        assert_eq!(manifest.schema_version, 2);
        assert_eq!(manifest.media_type.as_str(), MediaType::OCI1_MANIFEST);
        assert_eq!(manifest.config.get_data().unwrap(), b"{}");
    }

    #[test]
    fn test_placeholder_digest_unique_per_tag() {
        let created = "2026-01-01T00:00:00Z";
        let (_, a) = Manifest::placeholder("v1", created).to_descriptor().unwrap();
        let (_, b) = Manifest::placeholder("v2", created).to_descriptor().unwrap();
        assert!(!a.same(&b));
        assert!(a.digest.starts_with("sha256:"));
    }

    #[test]
    fn test_to_descriptor_matches_body() {
        let manifest = Manifest::placeholder("latest", "2026-01-01T00:00:00Z");
        let (body, desc) = manifest.to_descriptor().unwrap();
        assert_eq!(desc.size, body.len() as u64);
        assert!(desc.digest().unwrap().verify(&body));
    }

    #[test]
    fn test_manifest_serialization() {
        let manifest = Manifest::new(empty_config(), Vec::new())
            .with_annotation(ANNOTATION_CREATED, "2026-01-01T00:00:00Z");

        let json = serde_json::to_string_pretty(&manifest).unwrap();
        assert!(json.contains("schemaVersion"));
        assert!(json.contains("mediaType"));
        assert!(json.contains("\"data\": \"e30=\""));
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_index_select() {
        let json = r#"{
            "schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.index.v1+json",
            "manifests": [
                {
                    "mediaType": "application/vnd.oci.image.manifest.v1+json",
                    "digest": "sha256:1111111111111111111111111111111111111111111111111111111111111111",
                    "size": 100,
                    "platform": {"architecture": "amd64", "os": "linux"}
                },
                {
                    "mediaType": "application/vnd.oci.image.manifest.v1+json",
                    "digest": "sha256:2222222222222222222222222222222222222222222222222222222222222222",
                    "size": 200,
                    "platform": {"architecture": "arm64", "os": "linux", "variant": "v8"}
                }
            ]
        }"#;
        let index: Index = serde_json::from_str(json).unwrap();
        let opt = MatchOpt::new().with_platform(Platform::new("linux", "arm64"));
        assert_eq!(index.select(&opt).unwrap().size, 200);

        let opt = MatchOpt::new().with_platform(Platform::new("windows", "amd64"));
        assert!(index.select(&opt).is_err());
    }

    #[test]
    fn test_tag_list_deserialization() {
        let json = r#"{
            "name": "mirror/alpine",
            "tags": ["3.18", "3.19", "latest"]
        }"#;

        let tags: TagList = serde_json::from_str(json).unwrap();
        assert_eq!(tags.name, "mirror/alpine");
        assert_eq!(tags.tags.unwrap().len(), 3);

        let empty: TagList = serde_json::from_str(r#"{"name": "x", "tags": null}"#).unwrap();
        assert!(empty.tags.is_none());
    }

    #[test]
    fn test_error_response_summary() {
        let json = r#"{"errors": [{"code": "UNSUPPORTED", "message": "The operation is unsupported."}]}"#;
        let resp: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.summary(), "UNSUPPORTED: The operation is unsupported.");
    }
}
