//! containers `storage.conf` support.
//!
//! Only the settings that locate images are read: the driver, the graph
//! root, additional image stores and the UID/GID remapping ranges.

use crate::error::{HoldError, Result};
use crate::idmap::{IdMap, parse_id_maps};
use crate::storage::StorageOptions;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(test)]
#[path = "conf_tests.rs"]
mod tests;

/// System-wide `storage.conf` location.
pub const SYSTEM_STORAGE_CONF: &str = "/etc/containers/storage.conf";

/// Parsed contents of a `storage.conf` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageConf {
    #[serde(default)]
    pub storage: StorageSection,
}

/// The `[storage]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub graphroot: Option<String>,
    #[serde(default)]
    pub options: StorageSectionOptions,
}

/// The `[storage.options]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageSectionOptions {
    #[serde(default)]
    pub additionalimagestores: Vec<String>,
    #[serde(rename = "remap-uids", default)]
    pub remap_uids: Option<String>,
    #[serde(rename = "remap-gids", default)]
    pub remap_gids: Option<String>,
}

impl StorageConf {
    /// Parses `storage.conf` contents.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| {
            HoldError::config_with_source("Failed to parse storage.conf", None::<String>, e)
        })
    }

    /// Loads `storage.conf` from a path; a missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).map(Some).map_err(|e| match e {
                HoldError::Config { message, source, .. } => HoldError::Config {
                    message,
                    path: Some(path.display().to_string()),
                    source,
                },
                other => other,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoldError::config_with_source(
                "Failed to read storage.conf".to_string(),
                Some(path.display().to_string()),
                e,
            )),
        }
    }

    /// Applies the file's settings on top of existing options.
    pub fn apply(&self, options: &mut StorageOptions) {
        if let Some(driver) = self.storage.driver.as_deref().filter(|d| !d.is_empty()) {
            options.driver = driver.to_string();
        }
        if let Some(root) = self.storage.graphroot.as_deref().filter(|r| !r.is_empty()) {
            options.graph_root = PathBuf::from(root);
        }
        for store in &self.storage.options.additionalimagestores {
            let store = PathBuf::from(store);
            if !options.image_stores.contains(&store) {
                options.image_stores.push(store);
            }
        }
    }

    /// UID remapping ranges, if configured.
    pub fn uid_maps(&self) -> Result<Vec<IdMap>> {
        parse_id_maps(self.storage.options.remap_uids.as_deref().unwrap_or_default())
    }

    /// GID remapping ranges, if configured.
    pub fn gid_maps(&self) -> Result<Vec<IdMap>> {
        parse_id_maps(self.storage.options.remap_gids.as_deref().unwrap_or_default())
    }
}
