/// Images command handlers and logic
pub mod images;

/// Version command handlers
pub mod version;
