//! Basic usage example for the Hold library.
//!
//! Lists the images in a containers-storage tree, optionally filtered.
//!
//! Run with: cargo run --example basic_usage -- [GRAPH_ROOT] [FILTER]

use libhold::{ListRequest, Storage, StorageOptions, list_images};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut options = StorageOptions::default();
    if let Some(root) = args.next() {
        options.graph_root = PathBuf::from(root);
    }
    let request = ListRequest {
        filter: args.next(),
        ..ListRequest::default()
    };

    println!("Listing images in {}\n", options.graph_root.display());
    let storage = Storage::open(options);
    let listing = list_images(&storage, &request)?;

    if listing.rows.is_empty() {
        println!("No images found");
        return Ok(());
    }
    for row in &listing.rows {
        let name = if row.name.is_empty() { "<none>" } else { &row.name };
        let tag = if row.tag.is_empty() { "<none>" } else { &row.tag };
        println!("  {}  {}:{}  {}  {}", row.id, name, tag, row.created_at, row.size);
    }
    println!("\n{} images, {} rows", listing.images.len(), listing.rows.len());
    Ok(())
}
