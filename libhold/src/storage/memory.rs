//! In-memory [`ImageStore`].
//!
//! Holds records, configurations and parentage supplied by the caller. Used
//! to drive the listing pipeline without a containers-storage tree.

use crate::error::{HoldError, Result};
use crate::storage::{ImageInfo, ImageRecord, ImageStore};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    images: Vec<ImageRecord>,
    infos: HashMap<String, ImageInfo>,
    parents: HashSet<String>,
    broken_lineage: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an image; without [`with_info`](Self::with_info) inspecting it fails.
    pub fn with_image(mut self, image: ImageRecord) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_info(mut self, id: &str, info: ImageInfo) -> Self {
        self.infos.insert(id.to_string(), info);
        self
    }

    /// Marks an image as the parent of another image.
    pub fn with_parent(mut self, id: &str) -> Self {
        self.parents.insert(id.to_string());
        self
    }

    /// Makes the parentage lookup for an image fail.
    pub fn with_broken_lineage(mut self, id: &str) -> Self {
        self.broken_lineage.insert(id.to_string());
        self
    }
}

impl ImageStore for MemoryStore {
    fn images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.images.clone())
    }

    fn inspect(&self, image: &ImageRecord) -> Result<ImageInfo> {
        self.infos
            .get(&image.id)
            .cloned()
            .ok_or_else(|| HoldError::not_found("image configuration", image.id.as_str()))
    }

    fn is_parent(&self, image: &ImageRecord) -> Result<bool> {
        if self.broken_lineage.contains(&image.id) {
            return Err(HoldError::storage(
                format!("layer chain for image {} is unreadable", image.id),
                None::<String>,
            ));
        }
        Ok(self.parents.contains(&image.id))
    }
}
