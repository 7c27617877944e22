//! Conversion between storage ID maps and OCI runtime ID mappings.
//!
//! Containers storage describes user namespace remapping as
//! `container:host:size` ranges (the `remap-uids`/`remap-gids` options of
//! `storage.conf`). Runtime specs carry the same ranges as
//! [`LinuxIdMapping`] values with 32-bit fields.

use crate::error::{HoldError, Result};
use oci_spec::runtime::{LinuxIdMapping, LinuxIdMappingBuilder};
use serde::{Deserialize, Serialize};


/// One contiguous ID range as recorded by containers storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMap {
    /// First ID inside the container
    pub container_id: u64,
    /// First ID on the host
    pub host_id: u64,
    /// Number of IDs in the range
    pub size: u64,
}

impl IdMap {
    pub fn new(container_id: u64, host_id: u64, size: u64) -> Self {
        Self {
            container_id,
            host_id,
            size,
        }
    }
}

/// Parses a comma separated list of `container:host:size` ranges.
///
/// Whitespace around entries is ignored; an empty string yields no ranges.
///
/// # Examples
///
/// ```
/// use libhold::idmap::{parse_id_maps, IdMap};
///
/// let maps = parse_id_maps("0:100000:65536").unwrap();
/// assert_eq!(maps, vec![IdMap::new(0, 100000, 65536)]);
/// ```
pub fn parse_id_maps(ranges: &str) -> Result<Vec<IdMap>> {
    ranges
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_id_map)
        .collect()
}

fn parse_id_map(entry: &str) -> Result<IdMap> {
    let fields: Vec<&str> = entry.split(':').collect();
    let &[container_id, host_id, size] = fields.as_slice() else {
        return Err(HoldError::validation(format!(
            "ID mapping {:?} is not of the form container:host:size",
            entry
        )));
    };
    let parse = |field: &str| {
        field.parse::<u64>().map_err(|e| {
            HoldError::validation_with_source(format!("Invalid ID mapping {:?}", entry), e)
        })
    };
    Ok(IdMap::new(parse(container_id)?, parse(host_id)?, parse(size)?))
}

fn narrow(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|e| {
        HoldError::validation_with_source(format!("{} {} does not fit in 32 bits", what, value), e)
    })
}

/// Converts storage ID maps into runtime ID mappings, preserving order.
pub fn to_runtime_mappings(maps: &[IdMap]) -> Result<Vec<LinuxIdMapping>> {
    maps.iter()
        .map(|m| {
            LinuxIdMappingBuilder::default()
                .container_id(narrow(m.container_id, "container ID")?)
                .host_id(narrow(m.host_id, "host ID")?)
                .size(narrow(m.size, "mapping size")?)
                .build()
                .map_err(|e| HoldError::validation_with_source("Failed to build ID mapping", e))
        })
        .collect()
}

/// Converts runtime ID mappings back into storage ID maps, preserving order.
pub fn from_runtime_mappings(mappings: &[LinuxIdMapping]) -> Vec<IdMap> {
    mappings
        .iter()
        .map(|m| {
            IdMap::new(
                u64::from(m.container_id()),
                u64::from(m.host_id()),
                u64::from(m.size()),
            )
        })
        .collect()
}
