//! Application configuration.
//!
//! This module manages application configuration with sensible defaults,
//! loading from a YAML file on top of them.

use crate::error::{HoldError, Result};
use crate::listing::Column;
use crate::storage::StorageOptions;
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub headers: Headers,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            if p.exists() {
                builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
            } else {
                tracing::debug!("config file {} does not exist, using defaults", p.display());
            }
        }

        Self::from_builder(builder, path)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                HoldError::config_with_source(
                    "Failed to deserialize configuration",
                    path.map(|p| p.display().to_string()),
                    e,
                )
            })
    }
}

/// Storage location overrides. Unset values fall through to `storage.conf`
/// and the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Storage {
    #[serde(default)]
    pub driver: Option<String>,

    #[serde(default)]
    pub graph_root: Option<String>,

    #[serde(default)]
    pub image_stores: Vec<String>,
}

impl Storage {
    /// Applies the configured values on top of existing options.
    pub fn apply(&self, options: &mut StorageOptions) {
        if let Some(driver) = self.driver.as_deref().filter(|d| !d.is_empty()) {
            options.driver = driver.to_string();
        }
        if let Some(root) = self.graph_root.as_deref().filter(|r| !r.is_empty()) {
            options.graph_root = PathBuf::from(root);
        }
        for store in &self.image_stores {
            let store = PathBuf::from(store);
            if !options.image_stores.contains(&store) {
                options.image_stores.push(store);
            }
        }
    }
}

/// Output formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Output {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Enum for color output choices.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,

    Always,

    Never,
}

impl FromStr for ColorChoice {
    type Err = HoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(HoldError::config(
                format!("invalid color choice '{}', expected auto, always or never", other),
                None::<String>,
            )),
        }
    }
}

/// Table header names, one per column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Headers {
    #[serde(default = "default_name_header")]
    pub name: String,
    #[serde(default = "default_tag_header")]
    pub tag: String,
    #[serde(default = "default_digest_header")]
    pub digest: String,
    #[serde(default = "default_digests_header")]
    pub digests: String,
    #[serde(default = "default_id_header")]
    pub id: String,
    #[serde(default = "default_created_at_header")]
    pub created_at: String,
    #[serde(default = "default_created_at_raw_header")]
    pub created_at_raw: String,
    #[serde(default = "default_size_header")]
    pub size: String,
    #[serde(default = "default_read_only_header")]
    pub read_only: String,
}

impl Default for Headers {
    fn default() -> Self {
        Self {
            name: default_name_header(),
            tag: default_tag_header(),
            digest: default_digest_header(),
            digests: default_digests_header(),
            id: default_id_header(),
            created_at: default_created_at_header(),
            created_at_raw: default_created_at_raw_header(),
            size: default_size_header(),
            read_only: default_read_only_header(),
        }
    }
}

impl Headers {
    /// Returns the header shown above a column.
    pub fn header(&self, column: Column) -> &str {
        match column {
            Column::Id => &self.id,
            Column::Name => &self.name,
            Column::Tag => &self.tag,
            Column::Digest => &self.digest,
            Column::Digests => &self.digests,
            Column::CreatedAt => &self.created_at,
            Column::CreatedAtRaw => &self.created_at_raw,
            Column::Size => &self.size,
            Column::ReadOnly => &self.read_only,
        }
    }
}

fn default_name_header() -> String {
    "REPOSITORY".to_string()
}

fn default_tag_header() -> String {
    "TAG".to_string()
}

fn default_digest_header() -> String {
    "DIGEST".to_string()
}

fn default_digests_header() -> String {
    "DIGESTS".to_string()
}

fn default_id_header() -> String {
    "IMAGE ID".to_string()
}

fn default_created_at_header() -> String {
    "CREATED".to_string()
}

fn default_created_at_raw_header() -> String {
    "CREATED AT".to_string()
}

fn default_size_header() -> String {
    "SIZE".to_string()
}

fn default_read_only_header() -> String {
    "R/O".to_string()
}
