//! Image filter expressions.
//!
//! A filter expression is a comma separated list of `key=value` clauses:
//!
//! | key         | value                           |
//! |-------------|---------------------------------|
//! | `dangling`  | `true` or `false`               |
//! | `readonly`  | `true` or `false`               |
//! | `label`     | `key` or `key=value`            |
//! | `before`    | image name or ID                |
//! | `since`     | image name or ID                |
//! | `reference` | reference pattern               |
//!
//! Every clause must hold for an image name to be listed.

use crate::error::{HoldError, Result};
use crate::reference::matches_reference;
use crate::storage::{ImageInfo, ImageRecord, ImageStore};
use chrono::{DateTime, Utc};

#[cfg(test)]
mod tests;

/// A `label=` clause: the key must be present, and equal to the value when given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter {
    pub key: String,
    pub value: Option<String>,
}

impl LabelFilter {
    fn parse(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((key, value)) => Self {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => Self {
                key: raw.to_string(),
                value: None,
            },
        }
    }

    fn matches(&self, info: &ImageInfo) -> bool {
        match info.labels.get(&self.key) {
            Some(actual) => self.value.as_ref().is_none_or(|wanted| wanted == actual),
            None => false,
        }
    }
}

/// A `before=` or `since=` clause resolved to the reference image's creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFilter {
    /// The image name or ID given in the filter
    pub reference: String,
    /// Creation time of that image
    pub at: DateTime<Utc>,
}

/// One image name under evaluation, together with its record and inspection result.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub record: &'a ImageRecord,
    /// Display name being tested; empty for an image without names
    pub name: &'a str,
    pub inspection: &'a Result<ImageInfo>,
}

/// Parsed filter clauses. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    dangling: Option<bool>,
    label: Option<LabelFilter>,
    before: Option<TimeFilter>,
    since: Option<TimeFilter>,
    reference: Option<String>,
    read_only: Option<bool>,
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    match value {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        other => Err(HoldError::invalid_filter_value(
            key,
            other.unwrap_or_default(),
        )),
    }
}

fn required<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str> {
    value.ok_or_else(|| HoldError::invalid_filter_key(key))
}

/// Finds the image a `before=`/`since=` value refers to and returns its creation time.
fn resolve_time<S: ImageStore + ?Sized>(
    store: &S,
    images: &[ImageRecord],
    key: &str,
    reference: &str,
) -> Result<TimeFilter> {
    let image = images
        .iter()
        .find(|image| {
            image
                .names
                .iter()
                .any(|name| matches_reference(name, reference))
                || (!reference.is_empty() && image.id.starts_with(reference))
        })
        .ok_or_else(|| HoldError::not_found("image", reference))?;

    let info = store.inspect(image).map_err(|e| {
        HoldError::validation_with_source(
            format!("unable to resolve filter {}={}: {}", key, reference, e),
            e,
        )
    })?;
    let at = info
        .created
        .or(image.created)
        .ok_or_else(|| HoldError::not_found("creation time of image", reference))?;

    Ok(TimeFilter {
        reference: reference.to_string(),
        at,
    })
}

impl FilterSet {
    /// Parses a filter expression.
    ///
    /// `before` and `since` are resolved against `images` through the store,
    /// which is the only I/O performed here. A repeated key keeps its last
    /// value.
    ///
    /// # Errors
    ///
    /// - [`HoldError::InvalidFilter`] for an unknown key, a missing value or a
    ///   boolean other than `true`/`false`
    /// - [`HoldError::NotFound`] when a `before`/`since` image does not exist
    /// - [`HoldError::Validation`] naming the clause when that image cannot be
    ///   inspected
    pub fn parse<S: ImageStore + ?Sized>(
        filter: &str,
        store: &S,
        images: &[ImageRecord],
    ) -> Result<Self> {
        let mut set = FilterSet::default();
        for clause in filter.split(',') {
            let (key, value) = match clause.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value)),
                None => (clause.trim(), None),
            };
            match key {
                "dangling" => set.dangling = Some(parse_bool(key, value)?),
                "readonly" => set.read_only = Some(parse_bool(key, value)?),
                "label" => set.label = Some(LabelFilter::parse(required(key, value)?)),
                "before" => set.before = Some(resolve_time(store, images, key, required(key, value)?)?),
                "since" => set.since = Some(resolve_time(store, images, key, required(key, value)?)?),
                "reference" => set.reference = Some(required(key, value)?.to_string()),
                _ => return Err(HoldError::invalid_filter_key(key)),
            }
        }
        Ok(set)
    }

    pub fn dangling(&self) -> Option<bool> {
        self.dangling
    }

    pub fn label(&self) -> Option<&LabelFilter> {
        self.label.as_ref()
    }

    pub fn before(&self) -> Option<&TimeFilter> {
        self.before.as_ref()
    }

    pub fn since(&self) -> Option<&TimeFilter> {
        self.since.as_ref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn read_only(&self) -> Option<bool> {
        self.read_only
    }

    /// Returns true when every clause holds for the candidate.
    pub fn matches(&self, candidate: &Candidate<'_>) -> bool {
        if let Some(dangling) = self.dangling {
            if dangling != candidate.name.is_empty() {
                return false;
            }
        }
        if let Some(label) = &self.label {
            // Labels of an image whose configuration cannot be read never match
            let matched = candidate
                .inspection
                .as_ref()
                .is_ok_and(|info| label.matches(info));
            if !matched {
                return false;
            }
        }
        if let Some(before) = &self.before {
            if !candidate.record.created.is_none_or(|t| t < before.at) {
                return false;
            }
        }
        if let Some(since) = &self.since {
            if !candidate.record.created.is_none_or(|t| t > since.at) {
                return false;
            }
        }
        if let Some(pattern) = &self.reference {
            if !matches_reference(candidate.name, pattern) {
                return false;
            }
        }
        if let Some(read_only) = self.read_only {
            if read_only != candidate.record.read_only {
                return false;
            }
        }
        true
    }
}

/// Evaluates an optional filter set; no filters means everything matches.
pub fn matches(filters: Option<&FilterSet>, candidate: &Candidate<'_>) -> bool {
    filters.is_none_or(|filters| filters.matches(candidate))
}
