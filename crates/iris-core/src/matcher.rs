//! Descriptor selection from manifest lists.
//!
//! [`search`] picks one entry out of a manifest list given a [`MatchOpt`].
//! Candidates are filtered by artifact type, annotations and platform;
//! exact platform matches outrank compatible ones, and an optional sort
//! annotation breaks the remaining ties.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::platform::Platform;

/// Criteria for selecting a descriptor from a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOpt {
    /// Wanted platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Annotations every candidate must carry with equal values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,

    /// Required artifact type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    /// Annotation used to order the surviving candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_annotation: Option<String>,

    /// Sort descending instead of ascending.
    #[serde(default)]
    pub sort_desc: bool,
}

impl MatchOpt {
    /// Creates options that accept every descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a platform.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Requires an annotation value.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Requires an artifact type.
    #[must_use]
    pub fn with_artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    /// Orders candidates by an annotation value.
    #[must_use]
    pub fn with_sort(mut self, annotation: impl Into<String>, desc: bool) -> Self {
        self.sort_annotation = Some(annotation.into());
        self.sort_desc = desc;
        self
    }

    /// Combines `self` with `changes`.
    ///
    /// Set fields in `changes` override, unset fields keep the base value,
    /// and annotation maps are unioned with `changes` winning on collisions.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_core::{MatchOpt, Platform};
    ///
    /// let base = MatchOpt::new().with_artifact_type("application/vnd.example.sbom");
    /// let merged = base.merge(&MatchOpt::new().with_platform(Platform::new("linux", "amd64")));
    /// assert_eq!(merged.artifact_type.as_deref(), Some("application/vnd.example.sbom"));
    /// assert!(merged.platform.is_some());
    /// ```
    #[must_use]
    pub fn merge(&self, changes: &Self) -> Self {
        let mut merged = self.clone();

        if let Some(ref platform) = changes.platform {
            merged.platform = Some(platform.clone());
        }
        if let Some(ref artifact_type) = changes.artifact_type {
            if !artifact_type.is_empty() {
                merged.artifact_type = Some(artifact_type.clone());
            }
        }
        if let Some(ref annotations) = changes.annotations {
            merged
                .annotations
                .get_or_insert_with(HashMap::new)
                .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(ref sort) = changes.sort_annotation {
            if !sort.is_empty() {
                merged.sort_annotation = Some(sort.clone());
            }
        }
        if changes.sort_desc {
            merged.sort_desc = true;
        }

        merged
    }

    fn accepts(&self, desc: &Descriptor) -> bool {
        if let Some(ref want) = self.artifact_type {
            if desc.artifact_type.as_ref() != Some(want) {
                return false;
            }
        }
        if let Some(ref want) = self.annotations {
            if !want
                .iter()
                .all(|(k, v)| desc.annotation(k) == Some(v.as_str()))
            {
                return false;
            }
        }
        true
    }
}

/// How a candidate satisfied the platform constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlatformFit {
    Exact,
    Compatible,
}

/// Selects the best descriptor from `list`.
///
/// Platform filtering only applies when some entry in `list` carries a
/// platform; entries without one are then excluded. When no entry carries a
/// platform the constraint is ignored. Ties that the sort annotation does not
/// break resolve to the earliest entry in list order.
///
/// # Examples
///
/// ```
/// use iris_core::{search, Descriptor, MatchOpt, MediaType, Platform};
///
/// let list = vec![
///     Descriptor::new(MediaType::oci_manifest(), "sha256:a", 1)
///         .with_platform(Platform::new("linux", "amd64")),
///     Descriptor::new(MediaType::oci_manifest(), "sha256:b", 1)
///         .with_platform(Platform::new("windows", "amd64")),
/// ];
///
/// let opt = MatchOpt::new().with_platform(Platform::new("darwin", "amd64"));
/// assert_eq!(search(&list, &opt).unwrap().digest, "sha256:a");
/// ```
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no descriptor survives filtering.
pub fn search<'a>(list: &'a [Descriptor], opt: &MatchOpt) -> Result<&'a Descriptor> {
    let want_platform = opt
        .platform
        .as_ref()
        .filter(|_| list.iter().any(|d| d.platform.is_some()));

    let mut candidates: Vec<(&Descriptor, Option<PlatformFit>)> = list
        .iter()
        .filter(|d| opt.accepts(d))
        .filter_map(|d| match want_platform {
            None => Some((d, None)),
            Some(want) => {
                let have = d.platform.as_ref()?;
                if have.matches(want) {
                    Some((d, Some(PlatformFit::Exact)))
                } else if have.compatible_with(want) {
                    Some((d, Some(PlatformFit::Compatible)))
                } else {
                    None
                }
            }
        })
        .collect();

    if candidates
        .iter()
        .any(|(_, fit)| *fit == Some(PlatformFit::Exact))
    {
        candidates.retain(|(_, fit)| *fit == Some(PlatformFit::Exact));
    }

    if let Some(ref key) = opt.sort_annotation {
        // stable sort keeps list order among equal keys
        candidates.sort_by(|(a, _), (b, _)| {
            match (a.annotation(key), b.annotation(key)) {
                (Some(x), Some(y)) if opt.sort_desc => y.cmp(x),
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    candidates
        .first()
        .map(|(d, _)| *d)
        .ok_or_else(|| Error::NotFound {
            reason: describe(opt),
        })
}

fn describe(opt: &MatchOpt) -> String {
    let mut parts = Vec::new();
    if let Some(ref platform) = opt.platform {
        parts.push(format!("platform {platform}"));
    }
    if let Some(ref artifact_type) = opt.artifact_type {
        parts.push(format!("artifact type {artifact_type}"));
    }
    if let Some(ref annotations) = opt.annotations {
        if !annotations.is_empty() {
            let mut keys: Vec<_> = annotations.iter().map(|(k, v)| format!("{k}={v}")).collect();
            keys.sort();
            parts.push(format!("annotations {}", keys.join(",")));
        }
    }
    if parts.is_empty() {
        "no descriptor in list".to_string()
    } else {
        format!("no descriptor matching {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Algorithm;
    use crate::mediatype::MediaType;

    const ARTIFACT: &str = "application/example.artifact";

    struct Fixture {
        amd64: Descriptor,
        arm64: Descriptor,
        amd64_win: Descriptor,
        annotated: Descriptor,
        annotated2: Descriptor,
        artifact: Descriptor,
        artifact2: Descriptor,
        artifact3: Descriptor,
    }

    impl Fixture {
        fn new() -> Self {
            let base = |seed: &str| {
                Descriptor::new(
                    MediaType::oci_manifest(),
                    Algorithm::Sha256.digest(seed.as_bytes()).to_string(),
                    12345,
                )
            };
            Self {
                amd64: base("amd64").with_platform(Platform::new("linux", "amd64")),
                arm64: base("arm64").with_platform(Platform::new("linux", "arm64")),
                amd64_win: base("win").with_platform(Platform::new("windows", "amd64")),
                annotated: base("annotated")
                    .with_platform(Platform::new("linux", "amd64"))
                    .with_annotation("runtime", "special runtime")
                    .with_annotation("version", "1.2.3")
                    .with_annotation("date", "2022-01-01 12:34:56"),
                annotated2: base("annotated2")
                    .with_platform(Platform::new("linux", "amd64"))
                    .with_annotation("runtime", "special runtime")
                    .with_annotation("version", "1.3.0")
                    .with_annotation("date", "2022-04-01 01:02:03"),
                artifact: base("artifact")
                    .with_artifact_type(ARTIFACT)
                    .with_annotation("version", "1.2.3")
                    .with_annotation("date", "2022-01-01 12:34:56"),
                artifact2: base("artifact2")
                    .with_artifact_type(ARTIFACT)
                    .with_annotation("version", "1.2.9")
                    .with_annotation("date", "2022-04-01 01:02:03")
                    .with_annotation("unique", "x"),
                artifact3: base("artifact3")
                    .with_artifact_type(ARTIFACT)
                    .with_annotation("version", "1.3.0")
                    .with_annotation("date", "2022-02-28 02:04:08"),
            }
        }

        fn list(&self) -> Vec<Descriptor> {
            vec![
                self.amd64.clone(),
                self.arm64.clone(),
                self.amd64_win.clone(),
                self.annotated.clone(),
                self.annotated2.clone(),
                self.artifact.clone(),
                self.artifact2.clone(),
                self.artifact3.clone(),
            ]
        }
    }

    fn linux_amd64() -> Platform {
        Platform::new("linux", "amd64")
    }

    fn artifact_opt() -> MatchOpt {
        MatchOpt {
            artifact_type: Some(ARTIFACT.to_string()),
            annotations: Some(HashMap::new()),
            ..MatchOpt::default()
        }
    }

    #[test]
    fn test_search_empty_list() {
        let err = search(&[], &MatchOpt::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_search_exact_platform() {
        let f = Fixture::new();
        let list = f.list();
        let opt = MatchOpt::new().with_platform(linux_amd64());
        assert_eq!(search(&list, &opt).unwrap(), &f.amd64);
    }

    #[test]
    fn test_search_compatible_platform() {
        let f = Fixture::new();
        let list = f.list();
        let opt = MatchOpt::new().with_platform(Platform::new("darwin", "amd64"));
        assert_eq!(search(&list, &opt).unwrap(), &f.amd64);
    }

    #[test]
    fn test_search_exact_outranks_compatible() {
        let f = Fixture::new();
        let list = f.list();
        let opt = MatchOpt::new().with_platform(Platform::new("windows", "amd64"));
        assert_eq!(search(&list, &opt).unwrap(), &f.amd64_win);

        // a compatible entry listed first still loses to a later exact entry
        let v2 = f
            .amd64
            .clone()
            .with_platform(linux_amd64().with_variant("v2"));
        let list = vec![f.amd64.clone(), v2.clone()];
        let opt = MatchOpt::new().with_platform(linux_amd64().with_variant("v2"));
        assert_eq!(search(&list, &opt).unwrap(), &v2);
    }

    #[test]
    fn test_search_platform_and_annotations() {
        let f = Fixture::new();
        let list = f.list();
        let opt = MatchOpt::new()
            .with_platform(linux_amd64())
            .with_annotation("runtime", "special runtime");
        assert_eq!(search(&list, &opt).unwrap(), &f.annotated);
    }

    #[test]
    fn test_search_artifact_with_platform_not_found() {
        let f = Fixture::new();
        let list = f.list();
        let opt = MatchOpt::new()
            .with_artifact_type(ARTIFACT)
            .with_platform(linux_amd64());
        assert!(search(&list, &opt).unwrap_err().is_not_found());
    }

    #[test]
    fn test_search_unknown_artifact_type_not_found() {
        let f = Fixture::new();
        let list = f.list();
        let opt = MatchOpt::new().with_artifact_type("application/missing");
        let err = search(&list, &opt).unwrap_err();
        assert!(err.to_string().contains("application/missing"));
    }

    #[test]
    fn test_search_platform_ignored_without_platform_entries() {
        let f = Fixture::new();
        let list = vec![f.artifact.clone(), f.artifact2.clone()];
        let opt = MatchOpt::new().with_platform(linux_amd64());
        assert_eq!(search(&list, &opt).unwrap(), &f.artifact);
    }

    #[test]
    fn test_search_artifact_first_in_list() {
        let f = Fixture::new();
        let list = f.list();
        assert_eq!(search(&list, &artifact_opt()).unwrap(), &f.artifact);
    }

    #[test]
    fn test_search_sort_ascending_and_descending() {
        let f = Fixture::new();
        let list = f.list();
        let asc = artifact_opt().with_sort("date", false);
        let desc = artifact_opt().with_sort("date", true);
        assert_eq!(search(&list, &asc).unwrap(), &f.artifact);
        assert_eq!(search(&list, &desc).unwrap(), &f.artifact2);

        let by_version = artifact_opt().with_sort("version", true);
        assert_eq!(search(&list, &by_version).unwrap(), &f.artifact3);
    }

    #[test]
    fn test_search_missing_sort_key_sorts_last() {
        let f = Fixture::new();
        let list = f.list();
        for desc in [false, true] {
            let opt = artifact_opt().with_sort("unique", desc);
            assert_eq!(search(&list, &opt).unwrap(), &f.artifact2);
        }
        let all = MatchOpt::new().with_sort("unique", true);
        assert_eq!(search(&list, &all).unwrap(), &f.artifact2);
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let opt = MatchOpt::new()
            .with_artifact_type(ARTIFACT)
            .with_platform(linux_amd64())
            .with_annotation("a", "1")
            .with_sort("date", true);
        assert_eq!(opt.merge(&MatchOpt::new()), opt);
        assert_eq!(MatchOpt::new().merge(&MatchOpt::new()), MatchOpt::new());
    }

    #[test]
    fn test_merge_progressive_refinement() {
        let opt = MatchOpt::new()
            .merge(&MatchOpt::new().with_artifact_type("application/vnd.example.artifact"))
            .merge(&MatchOpt::new().with_platform(linux_amd64()))
            .merge(
                &MatchOpt::new()
                    .with_annotation("annotation1", "value1")
                    .with_annotation("annotation2", "value2"),
            )
            .merge(&MatchOpt::new().with_sort("annotationSort", true))
            .merge(&MatchOpt::new().with_annotation("annotation3", "value3"));

        let expect = MatchOpt::new()
            .with_artifact_type("application/vnd.example.artifact")
            .with_platform(linux_amd64())
            .with_annotation("annotation1", "value1")
            .with_annotation("annotation2", "value2")
            .with_annotation("annotation3", "value3")
            .with_sort("annotationSort", true);
        assert_eq!(opt, expect);
    }

    #[test]
    fn test_merge_annotation_collision_prefers_changes() {
        let base = MatchOpt::new().with_annotation("k", "old").with_annotation("a", "1");
        let merged = base.merge(&MatchOpt::new().with_annotation("k", "new"));
        let annotations = merged.annotations.unwrap();
        assert_eq!(annotations.get("k").map(String::as_str), Some("new"));
        assert_eq!(annotations.get("a").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_merge_empty_strings_do_not_override() {
        let base = MatchOpt::new().with_artifact_type(ARTIFACT).with_sort("date", false);
        let changes = MatchOpt {
            artifact_type: Some(String::new()),
            sort_annotation: Some(String::new()),
            ..MatchOpt::default()
        };
        assert_eq!(base.merge(&changes), base);
    }
}
