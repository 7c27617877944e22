use super::*;
use std::error::Error;

#[test]
fn test_usage_error_message_is_verbatim() {
    let err = HoldError::Usage {
        message: "when using the --all switch, you may not pass any images names or IDs"
            .to_string(),
    };

    assert!(matches!(err, HoldError::Usage { .. }));
    assert!(err.to_string().starts_with("when using the --all switch"));
}

#[test]
fn test_invalid_filter_unknown_key() {
    let err = HoldError::InvalidFilter {
        key: "bogus".to_string(),
        value: None,
    };

    assert_eq!(err.to_string(), "invalid filter: 'bogus'");
}

#[test]
fn test_invalid_filter_bad_value_names_key_and_value() {
    let err = HoldError::invalid_filter_value("readonly", "yes");

    let message = err.to_string();
    assert!(message.contains("readonly"));
    assert!(message.contains("yes"));
}

#[test]
fn test_resource_error_not_found() {
    let err = HoldError::NotFound {
        resource_type: "image".to_string(),
        name: "busybox".to_string(),
    };

    assert!(matches!(err, HoldError::NotFound { .. }));
    assert!(err.to_string().contains("image"));
    assert!(err.to_string().contains("busybox"));
}

#[test]
fn test_storage_error_with_source() {
    let source_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");

    let err = HoldError::Storage {
        message: "failed to read images.json".to_string(),
        path: Some("/var/lib/containers/storage".to_string()),
        source: Some(Box::new(source_error)),
    };

    assert!(err.source().is_some());
    assert!(err.source().unwrap().to_string().contains("no such file"));
    assert!(err.to_string().contains("images.json"));
}

#[test]
fn test_validation_error_message() {
    let err = HoldError::Validation {
        message: "Invalid image reference: Alpine".to_string(),
        source: None,
    };

    assert!(err.to_string().contains("Invalid image reference"));
}

#[test]
fn test_config_error_invalid_file() {
    let err = HoldError::Config {
        message: "invalid config file".to_string(),
        path: Some("/path/to/config.yaml".to_string()),
        source: None,
    };

    assert!(matches!(err, HoldError::Config { .. }));
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn test_error_implements_error_trait() {
    let err = HoldError::usage("test error");

    let _: &dyn std::error::Error = &err;
}

// Tests for helper constructors

#[test]
fn test_not_found_helper_constructor() {
    let err = HoldError::not_found("image", "alpine:3.19");
    assert!(matches!(err, HoldError::NotFound { .. }));
    assert_eq!(err.to_string(), "image not found: alpine:3.19");
}

#[test]
fn test_storage_helper_constructor() {
    let err = HoldError::storage("corrupt layers.json", Some("/tmp/layers.json"));
    match err {
        HoldError::Storage { path, source, .. } => {
            assert_eq!(path.as_deref(), Some("/tmp/layers.json"));
            assert!(source.is_none());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_validation_with_source_helper_constructor() {
    let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid data");
    let err = HoldError::validation_with_source("invalid format", io_err);
    assert!(matches!(err, HoldError::Validation { .. }));
    assert!(err.source().is_some());
}

#[test]
fn test_config_with_source_helper_constructor() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = HoldError::config_with_source(
        "failed to read config",
        Some("/path/to/config.yaml"),
        io_err,
    );
    assert!(matches!(err, HoldError::Config { .. }));
    assert!(err.source().is_some());
}
