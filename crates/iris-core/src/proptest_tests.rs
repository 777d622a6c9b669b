//! Property-based tests for iris-core types.
//!
//! These tests use proptest to verify invariants across many randomly generated inputs.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::{search, Algorithm, Descriptor, MatchOpt, MediaType, Platform};

/// Strategy for generating media types.
fn media_type_strategy() -> impl Strategy<Value = MediaType> {
    prop_oneof![
        Just(MediaType::from(MediaType::DOCKER2_MANIFEST)),
        Just(MediaType::from(MediaType::OCI1_MANIFEST)),
        Just(MediaType::from(MediaType::OCI1_INDEX)),
        Just(MediaType::default()),
    ]
}

/// Strategy for generating platforms.
fn platform_strategy() -> impl Strategy<Value = Platform> {
    (
        "(linux|windows|darwin)",
        "(amd64|arm64|arm|386)",
        "(|v6|v7|v8)",
    )
        .prop_map(|(os, arch, variant)| Platform::new(os, arch).with_variant(variant))
}

/// Strategy for generating annotation maps.
fn annotations_strategy() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map("[a-z.]{1,12}", "[a-zA-Z0-9 ]{0,16}", 0..5)
}

/// Strategy for generating descriptors.
fn descriptor_strategy() -> impl Strategy<Value = Descriptor> {
    (
        media_type_strategy(),
        prop::collection::vec(any::<u8>(), 0..64),
        prop::option::of(annotations_strategy()),
        prop::option::of(prop::collection::vec("https://[a-z]{3,8}\\.example\\.com", 1..3)),
        prop::option::of(platform_strategy()),
        prop::option::of("application/vnd\\.[a-z]{3,10}"),
    )
        .prop_map(|(media_type, content, annotations, urls, platform, artifact_type)| {
            let mut d = Descriptor::new(
                media_type,
                Algorithm::Sha256.digest(&content).to_string(),
                content.len() as u64,
            );
            d.annotations = annotations;
            d.urls = urls;
            d.platform = platform;
            d.artifact_type = artifact_type;
            d
        })
}

proptest! {
    /// Every descriptor is equal to and the same as itself.
    #[test]
    fn descriptor_reflexive(d in descriptor_strategy()) {
        prop_assert!(d.equal(&d.clone()));
        prop_assert!(d.same(&d.clone()));
    }

    /// Equality implies sameness.
    #[test]
    fn equal_implies_same(a in descriptor_strategy(), b in descriptor_strategy()) {
        if a.equal(&b) {
            prop_assert!(a.same(&b));
        }
    }

    /// Changing only the media type keeps sameness but breaks equality.
    #[test]
    fn media_type_change_keeps_same(d in descriptor_strategy()) {
        let mut changed = d.clone();
        changed.media_type = MediaType::new(format!("{}+changed", d.media_type));
        prop_assert!(d.same(&changed));
        prop_assert!(!d.equal(&changed));
    }

    /// Changing the size breaks both relations.
    #[test]
    fn size_change_breaks_both(d in descriptor_strategy(), delta in 1u64..1000) {
        let mut changed = d.clone();
        changed.size = d.size + delta;
        prop_assert!(!d.same(&changed));
        prop_assert!(!d.equal(&changed));
    }

    /// Annotation insertion order never affects equality.
    #[test]
    fn annotation_order_irrelevant(annotations in annotations_strategy()) {
        let mut pairs: Vec<_> = annotations.into_iter().collect();
        let forward = pairs.iter().fold(Descriptor::default(), |d, (k, v)| d.with_annotation(k, v));
        pairs.reverse();
        let backward = pairs.iter().fold(Descriptor::default(), |d, (k, v)| d.with_annotation(k, v));
        prop_assert!(forward.equal(&backward));
    }

    /// Inline data always round-trips through get_data.
    #[test]
    fn inline_data_round_trip(content in prop::collection::vec(any::<u8>(), 0..256), sha512 in any::<bool>()) {
        let algorithm = if sha512 { Algorithm::Sha512 } else { Algorithm::Sha256 };
        let d = Descriptor::from_data(MediaType::oci_empty(), algorithm, &content);
        prop_assert_eq!(d.get_data().unwrap(), content.as_slice());
    }

    /// Merging an empty option is the identity.
    #[test]
    fn merge_empty_identity(platform in prop::option::of(platform_strategy()), annotations in prop::option::of(annotations_strategy())) {
        let opt = MatchOpt { platform, annotations, ..MatchOpt::default() };
        prop_assert_eq!(opt.merge(&MatchOpt::default()), opt);
    }

    /// A successful search always returns a member of the list.
    #[test]
    fn search_returns_member(list in prop::collection::vec(descriptor_strategy(), 0..8), platform in prop::option::of(platform_strategy())) {
        let opt = MatchOpt { platform, ..MatchOpt::default() };
        if let Ok(found) = search(&list, &opt) {
            prop_assert!(list.iter().any(|d| std::ptr::eq(d, found)));
        }
    }
}
