//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. containers `storage.conf`
//! 3. Config file values
//! 4. Environment variables
//! 5. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use libhold::config::ColorChoice;
use libhold::storage::conf::SYSTEM_STORAGE_CONF;
use libhold::{Config, StorageConf, StorageOptions};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Verbosity level selected with repeated `-v` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Normal,
    Verbose,
    VeryVerbose,
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Default log filter directive for this level
    pub fn log_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::VeryVerbose => "debug",
            VerbosityLevel::Trace => "trace",
        }
    }
}

/// Global flags that override configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFlags {
    pub color: Option<ColorChoice>,
    pub root: Option<PathBuf>,
    pub storage_driver: Option<String>,
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Where images are read from
    pub storage: StorageOptions,
    pub verbosity: VerbosityLevel,
}

/// Path of the hold config file: `$HOLD_CONFIG`, else `<config_dir>/hold/config.yaml`.
pub fn get_config_path() -> PathBuf {
    if let Ok(config_path) = env::var("HOLD_CONFIG") {
        return PathBuf::from(config_path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("hold").join("config.yaml")
    } else {
        PathBuf::from("config.yaml")
    }
}

fn is_root() -> bool {
    rustix::process::geteuid().is_root()
}

/// Path of the containers `storage.conf` to read.
pub fn get_storage_conf_path() -> PathBuf {
    if let Ok(path) = env::var("CONTAINERS_STORAGE_CONF") {
        return PathBuf::from(path);
    }
    if !is_root() {
        if let Some(user_conf) = dirs::config_dir()
            .map(|dir| dir.join("containers").join("storage.conf"))
            .filter(|path| path.exists())
        {
            return user_conf;
        }
    }
    PathBuf::from(SYSTEM_STORAGE_CONF)
}

/// Built-in storage location: the system store for root, the user's data
/// directory otherwise.
pub fn default_storage_options() -> StorageOptions {
    let mut options = StorageOptions::default();
    if !is_root() {
        if let Some(data_dir) = dirs::data_dir() {
            options.graph_root = data_dir.join("containers").join("storage");
        }
    }
    options
}

impl AppContext {
    /// Build context with precedence: defaults > storage.conf > config file > env vars > CLI flags
    pub fn build(verbosity: VerbosityLevel, flags: &GlobalFlags) -> Self {
        let storage_conf_path = get_storage_conf_path();
        let storage_conf = match StorageConf::load(&storage_conf_path) {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", storage_conf_path.display(), e);
                None
            }
        };

        let config_path = get_config_path();
        let config = match Config::load(Some(&config_path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", config_path.display(), e);
                Config::default()
            }
        };

        Self::resolve(
            default_storage_options(),
            storage_conf.as_ref(),
            config,
            |key| env::var(key).ok(),
            verbosity,
            flags,
        )
    }

    /// Combines already loaded sources; `env` looks up environment variables.
    pub fn resolve<F>(
        defaults: StorageOptions,
        storage_conf: Option<&StorageConf>,
        mut config: Config,
        env: F,
        verbosity: VerbosityLevel,
        flags: &GlobalFlags,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. Start with defaults
        let mut storage = defaults;

        // 2. storage.conf
        if let Some(conf) = storage_conf {
            conf.apply(&mut storage);
            match conf.uid_maps() {
                Ok(maps) => storage.uid_maps = maps,
                Err(e) => tracing::warn!("ignoring remap-uids: {}", e),
            }
            match conf.gid_maps() {
                Ok(maps) => storage.gid_maps = maps,
                Err(e) => tracing::warn!("ignoring remap-gids: {}", e),
            }
        }

        // 3. Config file
        config.storage.apply(&mut storage);

        // 4. Environment variables
        if let Some(root) = env("HOLD_ROOT").filter(|r| !r.is_empty()) {
            storage.graph_root = PathBuf::from(root);
        }
        if let Some(driver) = env("HOLD_STORAGE_DRIVER").filter(|d| !d.is_empty()) {
            storage.driver = driver;
        }
        if let Some(color) = env("HOLD_COLOR") {
            match ColorChoice::from_str(&color) {
                Ok(color) => config.output.color = color,
                Err(e) => tracing::warn!("ignoring HOLD_COLOR: {}", e),
            }
        }

        // 5. CLI flags (highest priority)
        if let Some(root) = &flags.root {
            storage.graph_root = root.clone();
        }
        if let Some(driver) = &flags.storage_driver {
            storage.driver = driver.clone();
        }
        if let Some(color) = flags.color {
            config.output.color = color;
        }

        tracing::debug!(
            "using storage {} with driver {} and {} additional image stores",
            storage.graph_root.display(),
            storage.driver,
            storage.image_stores.len()
        );

        Self {
            config,
            storage,
            verbosity,
        }
    }

    /// Context with built-in defaults only, detached from the environment.
    #[cfg(test)]
    pub fn for_tests(color: ColorChoice) -> Self {
        Self::resolve(
            StorageOptions::default(),
            None,
            Config::default(),
            |_| None,
            VerbosityLevel::Normal,
            &GlobalFlags {
                color: Some(color),
                ..GlobalFlags::default()
            },
        )
    }
}
