//! Hold - local container image listing library
//!
//! Hold reads the image metadata of a containers-storage tree and lists it
//! the way `images` commands do: filtered, one row per name, newest first.
//!
//! # Quick Start
//!
//! ```no_run
//! use libhold::{ListRequest, Storage, StorageOptions, list_images};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Storage::open(StorageOptions::default());
//!     let request = ListRequest {
//!         filter: Some("dangling=false".to_string()),
//!         ..ListRequest::default()
//!     };
//!
//!     for row in list_images(&storage, &request)?.rows {
//!         println!("{} {}:{} {}", row.id, row.name, row.tag, row.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`storage`] - the [`ImageStore`] trait and the on-disk reader
//! - [`filter`] - filter expressions and their evaluation
//! - [`reference`] - image name normalization and matching
//! - [`listing`] - row projection and sorting
//! - [`format`] - size and age formatting
//! - [`idmap`] - UID/GID mapping conversion
//! - [`config`] - application configuration

#![warn(clippy::all)]

/// Returns the libhold crate version.
///
/// # Examples
///
/// ```
/// let version = libhold::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod idmap;
pub mod listing;
pub mod reference;
pub mod storage;

pub use config::Config;
pub use error::{HoldError, Result};
pub use filter::FilterSet;
pub use listing::{
    Column, DisplayRow, ImageListing, ImageSummary, ListOptions, ListRequest, list_images,
};
pub use reference::{Reference, matches_reference};
pub use storage::{
    ImageInfo, ImageRecord, ImageStore, MemoryStore, Storage, StorageConf, StorageOptions,
};
