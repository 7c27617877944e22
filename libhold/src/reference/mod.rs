//! Image reference normalization and matching.
//!
//! [`Reference`] wraps `oci_spec::distribution::Reference`, which expands
//! short names the way image tooling does (`alpine` becomes
//! `docker.io/library/alpine`). [`matches_reference`] implements the
//! repository/tag matching used by `images NAME` and `reference=` filters.

use crate::error::{HoldError, Result};
use oci_spec::distribution::Reference as OciReference;
use std::fmt;
use std::str::FromStr;


/// Represents a normalized image reference, wrapping `oci_spec::distribution::Reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference(OciReference);

impl FromStr for Reference {
    type Err = HoldError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_reference = OciReference::from_str(s).map_err(|e| HoldError::Validation {
            message: format!("Invalid image reference {:?}: {}", s, e),
            source: Some(Box::new(e)),
        })?;
        Ok(Reference(oci_reference))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Reference {
    /// Returns the registry part of the reference.
    pub fn registry(&self) -> &str {
        self.0.registry()
    }

    /// Returns the repository part of the reference.
    pub fn repository(&self) -> &str {
        self.0.repository()
    }

    /// Returns the fully qualified name without tag or digest,
    /// e.g. `docker.io/library/alpine`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry(), self.repository())
    }

    /// Returns the tag part of the reference, if present.
    pub fn tag(&self) -> Option<&str> {
        self.0.tag()
    }

    /// Returns the digest part of the reference, if present.
    pub fn digest(&self) -> Option<&str> {
        self.0.digest()
    }
}

/// A user supplied reference pattern split into its matching parts.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern<'a> {
    Name(&'a str),
    Tagged { repository: &'a str, tag: &'a str },
    Digested { repository: &'a str, digest: &'a str },
}

impl<'a> Pattern<'a> {
    fn parse(pattern: &'a str) -> Self {
        if let Some((repository, digest)) = pattern.split_once('@') {
            return Pattern::Digested { repository, digest };
        }
        // A colon before the last slash belongs to a registry port
        let last_slash = pattern.rfind('/').map_or(0, |i| i + 1);
        match pattern[last_slash..].rfind(':') {
            Some(i) => Pattern::Tagged {
                repository: &pattern[..last_slash + i],
                tag: &pattern[last_slash + i + 1..],
            },
            None => Pattern::Name(pattern),
        }
    }
}

fn repository_matches(name: &str, repository: &str) -> bool {
    name == repository || name.ends_with(&format!("/{}", repository))
}

/// Reports whether a stored image name matches a reference pattern.
///
/// An empty pattern matches everything and an empty name matches nothing
/// else. A pattern may name only the trailing path components of the
/// repository, so `myrepo/image` and `image` both match
/// `registry.example.com/myrepo/image`. When the pattern carries a tag the
/// tag must match exactly.
///
/// # Examples
///
/// ```
/// use libhold::reference::matches_reference;
///
/// assert!(matches_reference("registry.example.com/myrepo/image:v1", "myrepo/image:v1"));
/// assert!(!matches_reference("registry.example.com/myrepo/image:v1", "otherrepo/image:v1"));
/// assert!(matches_reference("anything", ""));
/// assert!(!matches_reference("", "anything"));
/// ```
pub fn matches_reference(image_name: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    if image_name.is_empty() {
        return false;
    }
    let named = match Reference::from_str(image_name) {
        Ok(named) => named,
        Err(e) => {
            tracing::warn!("Error parsing image name {:?}: {}", image_name, e);
            return false;
        }
    };
    let name = named.name();

    match Pattern::parse(pattern) {
        Pattern::Name(repository) => repository_matches(&name, repository),
        Pattern::Tagged { repository, tag } => {
            named.tag() == Some(tag) && repository_matches(&name, repository)
        }
        Pattern::Digested { repository, digest } => {
            named.digest() == Some(digest)
                && (repository.is_empty() || repository_matches(&name, repository))
        }
    }
}
