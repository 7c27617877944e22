use super::*;
use crate::storage::MemoryStore;
use std::collections::HashMap;

fn at(ts: &str) -> DateTime<Utc> {
    ts.parse().unwrap()
}

fn record(id: &str, names: &[&str], created: Option<&str>) -> ImageRecord {
    ImageRecord {
        id: id.to_string(),
        names: names.iter().map(|n| n.to_string()).collect(),
        created: created.map(at),
        ..ImageRecord::default()
    }
}

fn info(created: &str, labels: &[(&str, &str)]) -> ImageInfo {
    ImageInfo {
        created: Some(at(created)),
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

fn fixture() -> (MemoryStore, Vec<ImageRecord>) {
    let images = vec![
        record("1111aaaa", &["docker.io/library/alpine:3.19"], Some("2024-01-01T00:00:00Z")),
        record("2222bbbb", &["quay.io/team/app:v2"], Some("2024-02-01T00:00:00Z")),
        record("3333cccc", &[], None),
    ];
    let store = MemoryStore::new()
        .with_image(images[0].clone())
        .with_image(images[1].clone())
        .with_image(images[2].clone())
        .with_info("1111aaaa", info("2024-01-01T00:00:00Z", &[("tier", "base")]))
        .with_info("2222bbbb", info("2024-02-01T00:00:00Z", &[]));
    (store, images)
}

fn parse(filter: &str) -> Result<FilterSet> {
    let (store, images) = fixture();
    FilterSet::parse(filter, &store, &images)
}

#[test]
fn test_parse_booleans() {
    let set = parse("dangling=true,readonly=false").unwrap();
    assert_eq!(set.dangling(), Some(true));
    assert_eq!(set.read_only(), Some(false));
}

#[test]
fn test_parse_invalid_boolean_names_key_and_value() {
    let err = parse("dangling=maybe").unwrap_err();
    assert_eq!(err.to_string(), "invalid filter: 'dangling=[maybe]'");

    let err = parse("readonly").unwrap_err();
    assert!(matches!(err, HoldError::InvalidFilter { ref key, .. } if key == "readonly"));
}

#[test]
fn test_parse_unknown_key() {
    let err = parse("bogus=1").unwrap_err();
    assert_eq!(err.to_string(), "invalid filter: 'bogus'");
}

#[test]
fn test_parse_empty_key() {
    let err = parse("=value").unwrap_err();
    assert!(matches!(err, HoldError::InvalidFilter { ref key, .. } if key.is_empty()));
}

#[test]
fn test_parse_trims_key() {
    let set = parse(" dangling=false, reference=alpine").unwrap();
    assert_eq!(set.dangling(), Some(false));
    assert_eq!(set.reference(), Some("alpine"));
}

#[test]
fn test_parse_label_forms() {
    let set = parse("label=tier").unwrap();
    assert_eq!(
        set.label(),
        Some(&LabelFilter {
            key: "tier".to_string(),
            value: None
        })
    );

    let set = parse("label=tier=base").unwrap();
    assert_eq!(set.label().unwrap().value.as_deref(), Some("base"));
}

#[test]
fn test_parse_repeated_key_keeps_last() {
    let set = parse("dangling=true,dangling=false").unwrap();
    assert_eq!(set.dangling(), Some(false));
}

#[test]
fn test_parse_before_resolves_by_name() {
    let set = parse("before=quay.io/team/app:v2").unwrap();
    let before = set.before().unwrap();
    assert_eq!(before.reference, "quay.io/team/app:v2");
    assert_eq!(before.at, at("2024-02-01T00:00:00Z"));
}

#[test]
fn test_parse_since_resolves_by_short_name_and_id_prefix() {
    let set = parse("since=alpine").unwrap();
    assert_eq!(set.since().unwrap().at, at("2024-01-01T00:00:00Z"));

    let set = parse("since=2222").unwrap();
    assert_eq!(set.since().unwrap().at, at("2024-02-01T00:00:00Z"));
}

#[test]
fn test_parse_before_unknown_image() {
    let err = parse("before=missing").unwrap_err();
    assert_eq!(err.to_string(), "image not found: missing");
}

#[test]
fn test_parse_before_uninspectable_image() {
    let err = parse("before=3333").unwrap_err();
    assert!(matches!(err, HoldError::Validation { .. }));
    assert_eq!(
        err.to_string(),
        "Validation error: unable to resolve filter before=3333: image configuration not found: 3333cccc"
    );
    assert!(std::error::Error::source(&err).is_some());

    let err = parse("since=3333").unwrap_err();
    assert!(err.to_string().contains("since=3333"));
}

fn candidate_matches(filter: &str, record: &ImageRecord, name: &str, inspection: Result<ImageInfo>) -> bool {
    let set = parse(filter).unwrap();
    set.matches(&Candidate {
        record,
        name,
        inspection: &inspection,
    })
}

#[test]
fn test_matches_without_filters() {
    let image = record("x", &[], None);
    let inspection = Ok(ImageInfo::default());
    let candidate = Candidate {
        record: &image,
        name: "",
        inspection: &inspection,
    };
    assert!(matches(None, &candidate));
}

#[test]
fn test_matches_dangling() {
    let image = record("x", &[], None);
    assert!(candidate_matches("dangling=true", &image, "", Ok(ImageInfo::default())));
    assert!(!candidate_matches("dangling=true", &image, "alpine", Ok(ImageInfo::default())));
    assert!(candidate_matches("dangling=false", &image, "alpine", Ok(ImageInfo::default())));
    assert!(!candidate_matches("dangling=false", &image, "", Ok(ImageInfo::default())));
}

#[test]
fn test_matches_read_only() {
    let mut image = record("x", &["a"], None);
    assert!(!candidate_matches("readonly=true", &image, "a", Ok(ImageInfo::default())));
    image.read_only = true;
    assert!(candidate_matches("readonly=true", &image, "a", Ok(ImageInfo::default())));
    assert!(!candidate_matches("readonly=false", &image, "a", Ok(ImageInfo::default())));
}

#[test]
fn test_matches_label() {
    let image = record("x", &["a"], None);
    let labelled = || Ok(info("2024-01-01T00:00:00Z", &[("tier", "base")]));

    assert!(candidate_matches("label=tier", &image, "a", labelled()));
    assert!(candidate_matches("label=tier=base", &image, "a", labelled()));
    assert!(!candidate_matches("label=tier=web", &image, "a", labelled()));
    assert!(!candidate_matches("label=owner", &image, "a", labelled()));
}

#[test]
fn test_matches_label_inspection_failure_excludes() {
    let image = record("x", &["a"], None);
    let failed = Err(HoldError::not_found("image configuration", "x"));
    assert!(!candidate_matches("label=tier", &image, "a", failed));
}

#[test]
fn test_matches_before_and_since_are_strict() {
    let older = record("o", &["a"], Some("2023-06-01T00:00:00Z"));
    let same = record("s", &["a"], Some("2024-02-01T00:00:00Z"));
    let newer = record("n", &["a"], Some("2024-05-01T00:00:00Z"));
    let ok = || Ok(ImageInfo::default());

    assert!(candidate_matches("before=2222", &older, "a", ok()));
    assert!(!candidate_matches("before=2222", &same, "a", ok()));
    assert!(!candidate_matches("before=2222", &newer, "a", ok()));

    assert!(candidate_matches("since=2222", &newer, "a", ok()));
    assert!(!candidate_matches("since=2222", &same, "a", ok()));
    assert!(!candidate_matches("since=2222", &older, "a", ok()));
}

#[test]
fn test_matches_unset_creation_passes_time_filters() {
    let image = record("u", &["a"], None);
    assert!(candidate_matches("before=2222,since=2222", &image, "a", Ok(ImageInfo::default())));
}

#[test]
fn test_matches_reference() {
    let image = record("x", &["docker.io/library/alpine:3.19"], None);
    let name = "docker.io/library/alpine:3.19";
    assert!(candidate_matches("reference=alpine", &image, name, Ok(ImageInfo::default())));
    assert!(candidate_matches("reference=alpine:3.19", &image, name, Ok(ImageInfo::default())));
    assert!(!candidate_matches("reference=alpine:3.18", &image, name, Ok(ImageInfo::default())));
    assert!(!candidate_matches("reference=busybox", &image, name, Ok(ImageInfo::default())));
}

#[test]
fn test_matches_is_conjunctive() {
    let mut image = record("x", &["docker.io/library/alpine:3.19"], None);
    image.read_only = true;
    let name = "docker.io/library/alpine:3.19";
    assert!(candidate_matches(
        "reference=alpine,readonly=true,dangling=false",
        &image,
        name,
        Ok(ImageInfo::default())
    ));
    assert!(!candidate_matches(
        "reference=alpine,readonly=false",
        &image,
        name,
        Ok(ImageInfo::default())
    ));
}
