//! Image listing pipeline.
//!
//! [`list_images`] enumerates the store, evaluates the filter expression
//! against every image name and projects the survivors into
//! [`DisplayRow`]s (one per name) and [`ImageSummary`]s (one per image),
//! both sorted newest first.

use crate::error::{HoldError, Result};
use crate::filter::{Candidate, FilterSet, matches};
use crate::format::{format_optional_age, formatted_size};
use crate::reference::{Reference, matches_reference};
use crate::storage::{ImageRecord, ImageStore};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;


/// Length of an image ID when truncated for display.
pub const SHORT_ID_LEN: usize = 12;

/// A field of a [`DisplayRow`], addressable from output templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Name,
    Tag,
    Digest,
    Digests,
    CreatedAt,
    CreatedAtRaw,
    Size,
    ReadOnly,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Id,
        Column::Name,
        Column::Tag,
        Column::Digest,
        Column::Digests,
        Column::CreatedAt,
        Column::CreatedAtRaw,
        Column::Size,
        Column::ReadOnly,
    ];

    /// Template name of the field, as in `{{.CreatedAt}}`.
    pub fn field_name(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Name",
            Column::Tag => "Tag",
            Column::Digest => "Digest",
            Column::Digests => "Digests",
            Column::CreatedAt => "CreatedAt",
            Column::CreatedAtRaw => "CreatedAtRaw",
            Column::Size => "Size",
            Column::ReadOnly => "ReadOnly",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for Column {
    type Err = HoldError;

    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .into_iter()
            .find(|column| column.field_name() == s)
            .ok_or_else(|| HoldError::usage(format!("unknown template field: {}", s)))
    }
}

/// One line of table output: an image under one of its names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    /// `sha256:<id>`, or the short ID when truncating
    pub id: String,
    /// Normalized repository name; empty for an image without names
    pub name: String,
    /// Tag; empty when untagged
    pub tag: String,
    pub digest: String,
    pub digests: Vec<String>,
    /// Relative age, e.g. `2 hours ago`
    pub created_at: String,
    pub size: String,
    pub created_at_raw: Option<DateTime<Local>>,
    pub read_only: bool,
}

impl DisplayRow {
    /// Returns the raw value of a field.
    pub fn field(&self, column: Column) -> String {
        match column {
            Column::Id => self.id.clone(),
            Column::Name => self.name.clone(),
            Column::Tag => self.tag.clone(),
            Column::Digest => self.digest.clone(),
            Column::Digests => self.digests.join(","),
            Column::CreatedAt => self.created_at.clone(),
            Column::CreatedAtRaw => self
                .created_at_raw
                .map(|t| t.format("%Y-%m-%d %H:%M:%S %z").to_string())
                .unwrap_or_default(),
            Column::Size => self.size.clone(),
            Column::ReadOnly => self.read_only.to_string(),
        }
    }

    /// Returns a field for the default table, which shows `<none>` for an
    /// empty name or tag.
    pub fn cell(&self, column: Column) -> String {
        let value = self.field(column);
        match column {
            Column::Name | Column::Tag if value.is_empty() => "<none>".to_string(),
            _ => value,
        }
    }
}

/// JSON description of one listed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub digest: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub digests: Vec<String>,
    #[serde(rename = "createdat")]
    pub created_at: String,
    pub size: String,
    #[serde(rename = "createdatraw")]
    pub created_at_raw: Option<DateTime<Local>>,
    #[serde(rename = "readonly")]
    pub read_only: bool,
}

/// Switches that shape the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Include intermediate images
    pub all: bool,
    /// Shorten IDs to [`SHORT_ID_LEN`] characters
    pub truncate: bool,
    /// Keep a single row per image
    pub quiet: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            all: false,
            truncate: true,
            quiet: false,
        }
    }
}

/// What to list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Name argument; only images with a matching name are listed
    pub name: Option<String>,
    /// Filter expression, see [`crate::filter`]
    pub filter: Option<String>,
    pub options: ListOptions,
}

impl ListRequest {
    /// Checks argument combinations that are rejected before storage is read.
    pub fn validate(&self) -> Result<()> {
        if self.options.all && self.name.as_deref().is_some_and(|n| !n.is_empty()) {
            return Err(HoldError::usage(
                "when using the --all switch, you may not pass any images names or IDs",
            ));
        }
        Ok(())
    }
}

/// Result of [`list_images`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageListing {
    pub rows: Vec<DisplayRow>,
    pub images: Vec<ImageSummary>,
}

impl ImageListing {
    /// True when any listed row comes from a read-only store.
    pub fn has_read_only(&self) -> bool {
        self.rows.iter().any(|row| row.read_only)
    }
}

/// Returns the first [`SHORT_ID_LEN`] characters of an ID.
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// Sorts rows newest first. Rows without a creation time go last and equal
/// times keep their order.
pub fn sort_rows(rows: &mut [DisplayRow]) {
    rows.sort_by(|a, b| newest_first(a.created_at_raw, b.created_at_raw));
}

/// Sorts image summaries the same way as [`sort_rows`].
pub fn sort_summaries(images: &mut [ImageSummary]) {
    images.sort_by(|a, b| newest_first(a.created_at_raw, b.created_at_raw));
}

fn newest_first(a: Option<DateTime<Local>>, b: Option<DateTime<Local>>) -> std::cmp::Ordering {
    // None orders below Some, so reversing puts unset times last
    b.cmp(&a)
}

/// Creation time of an image: the configuration's wins over the record's.
fn creation_time(record: &ImageRecord, inspected: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (record.created, inspected) {
        (recorded, Some(inspected)) => {
            if recorded != Some(inspected) {
                tracing::debug!(
                    "image record and configuration disagree on the creation time of {}, using the configuration time {}",
                    record.id,
                    inspected
                );
            }
            Some(inspected)
        }
        (recorded, None) => recorded,
    }
}

/// A nameless image that another image is built on.
fn is_intermediate<S: ImageStore + ?Sized>(store: &S, record: &ImageRecord) -> bool {
    if !record.names.is_empty() {
        return false;
    }
    store.is_parent(record).unwrap_or_else(|e| {
        tracing::warn!("error checking if image {} is a parent: {}", record.id, e);
        false
    })
}

/// Lists the images in a store.
///
/// Per-image problems (unreadable configuration, unparseable names, broken
/// lineage) are logged and skipped.
///
/// # Errors
///
/// - [`HoldError::Usage`] for a name argument combined with `all`
/// - any error from enumerating the store or parsing the filter
/// - [`HoldError::NotFound`] when a name argument matched no image name
///
/// # Examples
///
/// ```
/// use libhold::listing::{ListRequest, list_images};
/// use libhold::storage::{ImageRecord, MemoryStore};
///
/// let store = MemoryStore::new().with_image(ImageRecord {
///     id: "0123456789abcdef".to_string(),
///     names: vec!["docker.io/library/alpine:latest".to_string()],
///     ..ImageRecord::default()
/// });
/// let listing = list_images(&store, &ListRequest::default()).unwrap();
/// assert_eq!(listing.rows[0].name, "docker.io/library/alpine");
/// assert_eq!(listing.rows[0].id, "0123456789ab");
/// ```
pub fn list_images<S: ImageStore + ?Sized>(store: &S, request: &ListRequest) -> Result<ImageListing> {
    request.validate()?;

    let images = store.images()?;
    let filters = match request.filter.as_deref() {
        Some(filter) if !filter.is_empty() => Some(FilterSet::parse(filter, store, &images)?),
        _ => None,
    };
    let wanted = request.name.as_deref().unwrap_or_default();
    let options = request.options;

    let mut listing = ImageListing::default();
    let mut found = false;

    for record in &images {
        let inspection = store.inspect(record);
        if let Err(e) = &inspection {
            tracing::debug!("unable to read configuration of image {}: {}", record.id, e);
        }
        let created = creation_time(record, inspection.as_ref().ok().and_then(|info| info.created));
        let created_local = created.map(|t| t.with_timezone(&Local));

        if !options.all && is_intermediate(store, record) {
            continue;
        }

        let id = if options.truncate {
            short_id(&record.id).to_string()
        } else {
            format!("sha256:{}", record.id)
        };

        let mut digests = record.digests.clone();
        let mut repos_and_tags: Vec<(String, String)> = Vec::new();
        let mut filter_matched = false;

        for name in &record.names {
            if name.is_empty() {
                tracing::warn!("found image {} with an empty name", record.id);
                continue;
            }
            let named = match Reference::from_str(name) {
                Ok(named) => named,
                Err(e) => {
                    tracing::warn!("error parsing name {:?}: {}", name, e);
                    continue;
                }
            };
            if *name != named.to_string() {
                tracing::debug!("image name {:?} is not in its normalized form ({})", name, named);
            }
            if !matches_reference(name, wanted) {
                continue;
            }
            found = true;

            if let Some(digest) = named.digest() {
                if !digests.iter().any(|d| d == digest) {
                    digests.push(digest.to_string());
                }
            }

            let candidate = Candidate {
                record,
                name,
                inspection: &inspection,
            };
            if !matches(filters.as_ref(), &candidate) {
                continue;
            }
            filter_matched = true;
            repos_and_tags.push((named.name(), named.tag().unwrap_or_default().to_string()));
        }

        if record.names.is_empty() {
            let candidate = Candidate {
                record,
                name: "",
                inspection: &inspection,
            };
            if matches(filters.as_ref(), &candidate) {
                filter_matched = true;
                repos_and_tags.push((String::new(), String::new()));
            }
        }
        if !filter_matched {
            continue;
        }

        let digest = record.digest.clone().unwrap_or_default();
        let created_at = format_optional_age(created.as_ref());
        let size = formatted_size(record.size);

        listing.images.push(ImageSummary {
            id: record.id.clone(),
            names: record.names.clone(),
            digest: digest.clone(),
            digests: digests.clone(),
            created_at: created_at.clone(),
            size: size.clone(),
            created_at_raw: created_local,
            read_only: record.read_only,
        });

        let per_image = if options.quiet { 1 } else { repos_and_tags.len() };
        for (name, tag) in repos_and_tags.into_iter().take(per_image) {
            listing.rows.push(DisplayRow {
                id: id.clone(),
                name,
                tag,
                digest: digest.clone(),
                digests: digests.clone(),
                created_at: created_at.clone(),
                size: size.clone(),
                created_at_raw: created_local,
                read_only: record.read_only,
            });
        }
    }

    if !found && !wanted.is_empty() {
        return Err(HoldError::not_found("image", wanted));
    }

    sort_rows(&mut listing.rows);
    sort_summaries(&mut listing.images);
    Ok(listing)
}
