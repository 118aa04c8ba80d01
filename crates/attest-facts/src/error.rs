//! Errors raised while harvesting and storing facts.

use std::path::PathBuf;

/// A misused annotation. Aborts harvesting of the offending element only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarvestError {
    #[error("annotation @{annotation} on {element} must define the attribute {attribute}")]
    MissingAttribute {
        annotation: &'static str,
        attribute: &'static str,
        element: String,
    },

    #[error("annotation @{annotation} on {element}: attribute {attribute} must be {expected}")]
    InvalidAttribute {
        annotation: &'static str,
        attribute: &'static str,
        expected: &'static str,
        element: String,
    },
}

/// Failure to read or write the fact store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("fact store not found: {0}")]
    NotFound(PathBuf),

    #[error("fact store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode facts: {0}")]
    Encode(String),

    #[error("failed to decode facts: {0}")]
    Decode(String),

    #[error("fact store format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}
