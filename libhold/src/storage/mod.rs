//! Read-only access to containers-storage image metadata.
//!
//! The listing pipeline only talks to storage through the [`ImageStore`]
//! trait. [`Storage`] implements it over the on-disk layout used by
//! containers-storage:
//!
//! - `<root>/<driver>-images/images.json` - image records
//! - `<root>/<driver>-images/<id>/<big-data-name>` - configuration blobs
//! - `<root>/<driver>-layers/layers.json` - layer records and parentage
//!
//! Nothing in this module writes to or locks storage.

use crate::error::{HoldError, Result};
use crate::idmap::{IdMap, to_runtime_mappings};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, Utc};
use oci_spec::image::ImageConfiguration;
use oci_spec::runtime::LinuxIdMapping;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod conf;
pub mod memory;

pub use conf::StorageConf;
pub use memory::MemoryStore;


/// Default storage driver when none is configured.
pub const DEFAULT_DRIVER: &str = "overlay";

/// Default graph root for a root user.
pub const DEFAULT_GRAPH_ROOT: &str = "/var/lib/containers/storage";

/// Metadata for one stored image.
///
/// Records are produced by an [`ImageStore`] and never modified by the
/// listing pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRecord {
    /// Image ID (hex, without the `sha256:` prefix)
    pub id: String,
    /// Names (repository and tag) in store order
    pub names: Vec<String>,
    /// Creation time as recorded by the store; `None` when unset
    pub created: Option<DateTime<Utc>>,
    /// Total size in bytes
    pub size: u64,
    /// Digest of the image manifest
    pub digest: Option<String>,
    /// Every manifest digest known for this image
    pub digests: Vec<String>,
    /// Set for images that live in an additional, read-only image store
    pub read_only: bool,
    /// ID of the topmost layer
    pub top_layer: Option<String>,
    /// Big-data key holding the image configuration
    pub config_key: Option<String>,
}

/// Details read from an image's configuration blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    /// Creation time recorded in the configuration
    pub created: Option<DateTime<Utc>>,
    /// Configuration labels
    pub labels: HashMap<String, String>,
}

/// Access to the images held in a local store.
///
/// Implementations may perform blocking I/O. `inspect` and `is_parent` are
/// called once per image by the listing pipeline, which treats their errors
/// as soft failures for that image.
pub trait ImageStore {
    /// Enumerate every stored image.
    fn images(&self) -> Result<Vec<ImageRecord>>;

    /// Read the configuration of an image.
    fn inspect(&self, image: &ImageRecord) -> Result<ImageInfo>;

    /// Report whether another stored image is built on top of this one.
    fn is_parent(&self, image: &ImageRecord) -> Result<bool>;
}

/// Location and driver of a containers-storage tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Primary, writable graph root
    pub graph_root: PathBuf,
    /// Storage driver name, used to locate `<driver>-images`
    pub driver: String,
    /// Additional read-only image stores
    pub image_stores: Vec<PathBuf>,
    /// UID ranges the store's layers are remapped with
    pub uid_maps: Vec<IdMap>,
    /// GID ranges the store's layers are remapped with
    pub gid_maps: Vec<IdMap>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            graph_root: PathBuf::from(DEFAULT_GRAPH_ROOT),
            driver: DEFAULT_DRIVER.to_string(),
            image_stores: Vec::new(),
            uid_maps: Vec::new(),
            gid_maps: Vec::new(),
        }
    }
}

impl StorageOptions {
    /// The UID and GID remapping ranges as OCI runtime mappings.
    pub fn runtime_id_mappings(&self) -> Result<(Vec<LinuxIdMapping>, Vec<LinuxIdMapping>)> {
        Ok((
            to_runtime_mappings(&self.uid_maps)?,
            to_runtime_mappings(&self.gid_maps)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct StoredImage {
    id: String,
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    digests: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(rename = "big-data-names", default)]
    big_data_names: Vec<String>,
    #[serde(rename = "big-data-sizes", default)]
    big_data_sizes: HashMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct StoredLayer {
    id: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(rename = "diff-size", default)]
    diff_size: u64,
}

/// Returns the file name containers-storage uses for a big-data item.
///
/// Keys made only of lowercase letters, digits and dots are used verbatim;
/// anything else is stored as `=` followed by the key in standard base64.
///
/// # Examples
///
/// ```
/// use libhold::storage::big_data_file_name;
///
/// assert_eq!(big_data_file_name("manifest"), "manifest");
/// assert_eq!(big_data_file_name("sha256:ab"), "=c2hhMjU2OmFi");
/// ```
pub fn big_data_file_name(key: &str) -> String {
    let verbatim = key
        .bytes()
        .all(|b| b == b'.' || b.is_ascii_digit() || b.is_ascii_lowercase());
    if verbatim {
        key.to_string()
    } else {
        format!("={}", STANDARD.encode(key))
    }
}

/// containers-storage writes Go's zero time for images without a creation date.
fn non_zero(time: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    time.filter(|t| t.year() > 1)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(HoldError::storage_with_source(
                format!("Failed to read {}", path.display()),
                Some(path.display().to_string()),
                e,
            ));
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        HoldError::storage_with_source(
            format!("Failed to parse {}", path.display()),
            Some(path.display().to_string()),
            e,
        )
    })
}

/// containers-storage reader implementing [`ImageStore`].
///
/// Parsed `images.json` and `layers.json` contents are cached for the
/// lifetime of the handle.
#[derive(Debug)]
pub struct Storage {
    options: StorageOptions,
    records: OnceCell<Vec<ImageRecord>>,
    layers: OnceCell<HashMap<String, StoredLayer>>,
}

impl Storage {
    /// Opens a store. No files are read until the first query.
    pub fn open(options: StorageOptions) -> Self {
        Self {
            options,
            records: OnceCell::new(),
            layers: OnceCell::new(),
        }
    }

    /// Returns the options this store was opened with.
    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Store roots in lookup order: the graph root, then additional stores.
    fn roots(&self) -> impl Iterator<Item = (&Path, bool)> {
        std::iter::once((self.options.graph_root.as_path(), false)).chain(
            self.options
                .image_stores
                .iter()
                .map(|root| (root.as_path(), true)),
        )
    }

    fn images_dir(&self, root: &Path) -> PathBuf {
        root.join(format!("{}-images", self.options.driver))
    }

    fn layers_dir(&self, root: &Path) -> PathBuf {
        root.join(format!("{}-layers", self.options.driver))
    }

    fn layers(&self) -> Result<&HashMap<String, StoredLayer>> {
        if let Some(layers) = self.layers.get() {
            return Ok(layers);
        }
        let mut loaded = HashMap::new();
        for (root, _) in self.roots() {
            let path = self.layers_dir(root).join("layers.json");
            let Some(layers) = read_json::<Vec<StoredLayer>>(&path)? else {
                tracing::debug!("no layer records at {}", path.display());
                continue;
            };
            for layer in layers {
                loaded.entry(layer.id.clone()).or_insert(layer);
            }
        }
        Ok(self.layers.get_or_init(|| loaded))
    }

    fn records(&self) -> Result<&Vec<ImageRecord>> {
        if let Some(records) = self.records.get() {
            return Ok(records);
        }
        let layers = self.layers()?;
        let mut seen = HashSet::new();
        let mut loaded = Vec::new();
        for (root, read_only) in self.roots() {
            let path = self.images_dir(root).join("images.json");
            let Some(images) = read_json::<Vec<StoredImage>>(&path)? else {
                tracing::debug!("no image records at {}", path.display());
                continue;
            };
            for image in images {
                if !seen.insert(image.id.clone()) {
                    continue;
                }
                loaded.push(Self::to_record(image, read_only, layers));
            }
        }
        Ok(self.records.get_or_init(|| loaded))
    }

    fn to_record(
        image: StoredImage,
        read_only: bool,
        layers: &HashMap<String, StoredLayer>,
    ) -> ImageRecord {
        let big_data_size: u64 = image.big_data_sizes.values().sum();
        let layer_size = image
            .layer
            .as_deref()
            .map_or(0, |top| layer_chain_size(top, layers));
        let config_key = image
            .big_data_names
            .iter()
            .find(|name| name.starts_with("sha256:"))
            .cloned();

        ImageRecord {
            id: image.id,
            names: image.names,
            created: non_zero(image.created),
            size: big_data_size + layer_size,
            digest: image.digest.filter(|d| !d.is_empty()),
            digests: image.digests,
            read_only,
            top_layer: image.layer,
            config_key,
        }
    }

    fn config_path(&self, image: &ImageRecord) -> Option<PathBuf> {
        let key = image
            .config_key
            .clone()
            .unwrap_or_else(|| format!("sha256:{}", image.id));
        let file_name = big_data_file_name(&key);
        self.roots()
            .map(|(root, _)| self.images_dir(root).join(&image.id))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(file_name))
    }
}

fn layer_chain_size(top: &str, layers: &HashMap<String, StoredLayer>) -> u64 {
    let mut total = 0;
    let mut visited = HashSet::new();
    let mut current = Some(top);
    while let Some(id) = current {
        if !visited.insert(id) {
            tracing::warn!("layer {} appears twice in its own parent chain", id);
            break;
        }
        let Some(layer) = layers.get(id) else {
            break;
        };
        total += layer.diff_size;
        current = layer.parent.as_deref();
    }
    total
}

impl ImageStore for Storage {
    fn images(&self) -> Result<Vec<ImageRecord>> {
        self.records().cloned()
    }

    fn inspect(&self, image: &ImageRecord) -> Result<ImageInfo> {
        let path = self
            .config_path(image)
            .ok_or_else(|| HoldError::not_found("image data directory", image.id.as_str()))?;
        let config: ImageConfiguration = read_json(&path)?.ok_or_else(|| {
            HoldError::not_found("image configuration", path.display().to_string().as_str())
        })?;

        let created = config.created().as_ref().and_then(|ts| {
            match DateTime::parse_from_rfc3339(ts) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    tracing::debug!("image {} has unparseable creation time {:?}: {}", image.id, ts, e);
                    None
                }
            }
        });
        let labels = config
            .config()
            .as_ref()
            .and_then(|c| c.labels().as_ref())
            .cloned()
            .unwrap_or_default();

        Ok(ImageInfo {
            created: non_zero(created),
            labels,
        })
    }

    fn is_parent(&self, image: &ImageRecord) -> Result<bool> {
        let Some(top) = image.top_layer.as_deref() else {
            return Ok(false);
        };
        let layers = self.layers()?;
        let records = self.records()?;
        Ok(records.iter().any(|other| {
            other.id != image.id
                && other
                    .top_layer
                    .as_deref()
                    .and_then(|layer| layers.get(layer))
                    .and_then(|layer| layer.parent.as_deref())
                    == Some(top)
        }))
    }
}
