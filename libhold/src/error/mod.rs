//! Error types for Hold
//!
//! Every fallible operation in the library returns [`HoldError`]. Variants
//! carry the offending key, value or path so a message can be diagnosed
//! without re-running at a higher verbosity.

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Main error type for Hold operations
#[derive(Error, Debug)]
pub enum HoldError {
    /// Bad flag combination or argument usage
    #[error("{message}")]
    Usage { message: String },

    /// Malformed filter clause, unknown filter key or invalid filter value
    #[error("invalid filter: '{}'", describe_clause(.key, .value.as_deref()))]
    InvalidFilter { key: String, value: Option<String> },

    /// A named resource (image, reference, config blob) does not exist
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Reading or decoding the image store failed
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors (invalid reference, malformed ID map, etc.)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for Hold operations
pub type Result<T> = std::result::Result<T, HoldError>;

fn describe_clause(key: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{}=[{}]", key, value),
        None => key.to_string(),
    }
}

impl HoldError {
    /// Creates a new usage error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    ///
    /// let err = HoldError::usage("quiet and format are mutually exclusive");
    /// assert_eq!(err.to_string(), "quiet and format are mutually exclusive");
    /// ```
    pub fn usage<S: Into<String>>(message: S) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates an invalid filter error for a key that is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    ///
    /// let err = HoldError::invalid_filter_key("bogus");
    /// assert_eq!(err.to_string(), "invalid filter: 'bogus'");
    /// ```
    pub fn invalid_filter_key<S: Into<String>>(key: S) -> Self {
        Self::InvalidFilter {
            key: key.into(),
            value: None,
        }
    }

    /// Creates an invalid filter error for a recognized key with a bad value.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    ///
    /// let err = HoldError::invalid_filter_value("dangling", "maybe");
    /// assert_eq!(err.to_string(), "invalid filter: 'dangling=[maybe]'");
    /// ```
    pub fn invalid_filter_value<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self::InvalidFilter {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a new not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    ///
    /// let err = HoldError::not_found("image", "alpine");
    /// assert_eq!(err.to_string(), "image not found: alpine");
    /// ```
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new storage error.
    pub fn storage<S: Into<String>, P: Into<String>>(message: S, path: Option<P>) -> Self {
        Self::Storage {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new storage error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    /// let err = HoldError::storage_with_source("failed to read images.json", Some("/tmp/x"), io_err);
    /// assert!(matches!(err, HoldError::Storage { .. }));
    /// ```
    pub fn storage_with_source<S, P, E>(message: S, path: Option<P>, source: E) -> Self
    where
        S: Into<String>,
        P: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    ///
    /// let err = HoldError::validation("invalid ID mapping");
    /// assert!(matches!(err, HoldError::Validation { .. }));
    /// ```
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libhold::error::HoldError;
    ///
    /// let err = HoldError::config("invalid config file", Some("/path/to/config.yaml"));
    /// assert!(matches!(err, HoldError::Config { .. }));
    /// ```
    pub fn config<S: Into<String>, P: Into<String>>(message: S, path: Option<P>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, P, E>(message: S, path: Option<P>, source: E) -> Self
    where
        S: Into<String>,
        P: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }
}

impl From<config::ConfigError> for HoldError {
    fn from(e: config::ConfigError) -> Self {
        HoldError::config_with_source("Failed to build configuration", None::<String>, e)
    }
}
