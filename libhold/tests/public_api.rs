use libhold::storage::big_data_file_name;
use libhold::{HoldError, ListOptions, ListRequest, Storage, StorageConf, StorageOptions, list_images};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const NGINX: &str = "1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f";
const BASE: &str = "2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e2e";
const APP: &str = "3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d";
const SHARED: &str = "4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c";

fn write_json(path: &Path, value: &serde_json::Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

fn write_config(root: &Path, id: &str, created: &str, labels: serde_json::Value) {
    let path = root
        .join("overlay-images")
        .join(id)
        .join(big_data_file_name(&format!("sha256:{}", id)));
    write_json(
        &path,
        &json!({
            "created": created,
            "architecture": "amd64",
            "os": "linux",
            "config": { "Labels": labels },
            "rootfs": { "type": "layers", "diff_ids": [] }
        }),
    );
}

/// Primary store with a named image, a nameless base layer image and an
/// image built on it, plus a read-only additional store.
fn fixture() -> (TempDir, TempDir) {
    let primary = tempdir().unwrap();
    let root = primary.path();
    write_json(
        &root.join("overlay-layers").join("layers.json"),
        &json!([
            { "id": "l-nginx", "diff-size": 140_000_000u64 },
            { "id": "l-base", "diff-size": 2_000_000 },
            { "id": "l-app", "parent": "l-base", "diff-size": 500_000 }
        ]),
    );
    write_json(
        &root.join("overlay-images").join("images.json"),
        &json!([
            {
                "id": NGINX,
                "names": ["docker.io/library/nginx:1.25"],
                "digest": "sha256:aaaa",
                "layer": "l-nginx",
                "created": "2024-04-01T00:00:00Z"
            },
            { "id": BASE, "layer": "l-base", "created": "2024-01-01T00:00:00Z" },
            {
                "id": APP,
                "names": ["localhost/app:dev", "localhost/app:latest"],
                "layer": "l-app",
                "created": "2024-05-01T00:00:00Z"
            }
        ]),
    );
    write_config(root, NGINX, "2024-04-01T00:00:00Z", json!({ "vendor": "nginx" }));
    write_config(root, APP, "2024-05-01T00:00:00Z", json!({ "vendor": "local" }));

    let shared = tempdir().unwrap();
    write_json(
        &shared.path().join("overlay-images").join("images.json"),
        &json!([{
            "id": SHARED,
            "names": ["registry.example.com/tools/kit:2"],
            "created": "2023-06-01T00:00:00Z"
        }]),
    );
    (primary, shared)
}

fn storage(primary: &TempDir, shared: &TempDir) -> Storage {
    Storage::open(StorageOptions {
        graph_root: primary.path().to_path_buf(),
        driver: "overlay".to_string(),
        image_stores: vec![shared.path().to_path_buf()],
        ..StorageOptions::default()
    })
}

#[test]
fn test_version() {
    assert!(!libhold::version().is_empty());
}

#[test]
fn test_lists_store_newest_first() {
    let (primary, shared) = fixture();
    let listing = list_images(&storage(&primary, &shared), &ListRequest::default()).unwrap();

    let rows: Vec<_> = listing
        .rows
        .iter()
        .map(|row| (row.name.as_str(), row.tag.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("localhost/app", "dev"),
            ("localhost/app", "latest"),
            ("docker.io/library/nginx", "1.25"),
            ("registry.example.com/tools/kit", "2"),
        ]
    );
    assert_eq!(listing.rows[2].size, "140 MB");
    assert_eq!(listing.rows[0].size, "2.50 MB");
    assert!(listing.rows[3].read_only);
}

#[test]
fn test_all_shows_intermediate_image() {
    let (primary, shared) = fixture();
    let request = ListRequest {
        options: ListOptions {
            all: true,
            truncate: false,
            quiet: false,
        },
        ..ListRequest::default()
    };
    let listing = list_images(&storage(&primary, &shared), &request).unwrap();
    assert!(listing.rows.iter().any(|row| row.id == format!("sha256:{}", BASE)));
}

#[test]
fn test_filters_against_disk() {
    let (primary, shared) = fixture();
    let store = storage(&primary, &shared);

    let request = ListRequest {
        filter: Some("label=vendor=nginx".to_string()),
        ..ListRequest::default()
    };
    let listing = list_images(&store, &request).unwrap();
    assert_eq!(listing.images.len(), 1);
    assert_eq!(listing.images[0].id, NGINX);

    let request = ListRequest {
        filter: Some("readonly=true".to_string()),
        ..ListRequest::default()
    };
    let listing = list_images(&store, &request).unwrap();
    assert_eq!(listing.images.len(), 1);
    assert_eq!(listing.images[0].id, SHARED);

    let request = ListRequest {
        filter: Some("before=nginx".to_string()),
        ..ListRequest::default()
    };
    let listing = list_images(&store, &request).unwrap();
    assert_eq!(listing.images.len(), 1);
    assert_eq!(listing.images[0].id, SHARED);
}

#[test]
fn test_unknown_name_is_not_found() {
    let (primary, shared) = fixture();
    let request = ListRequest {
        name: Some("busybox".to_string()),
        ..ListRequest::default()
    };
    let err = list_images(&storage(&primary, &shared), &request).unwrap_err();
    assert!(matches!(err, HoldError::NotFound { .. }));
}

#[test]
fn test_storage_conf_points_at_store() {
    let (primary, shared) = fixture();
    let conf = StorageConf::from_toml_str(&format!(
        "[storage]\ndriver = \"overlay\"\ngraphroot = {:?}\n",
        primary.path().display().to_string()
    ))
    .unwrap();
    let mut options = StorageOptions::default();
    conf.apply(&mut options);

    let listing = list_images(&Storage::open(options), &ListRequest::default()).unwrap();
    assert_eq!(listing.images.len(), 2);
    drop(shared);
}
