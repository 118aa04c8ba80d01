//! Errors of the type-system view.

use std::path::PathBuf;

/// A malformed type model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid type {input:?}: {reason}")]
    InvalidType { input: String, reason: String },

    #[error("invalid type model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to access type model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a structural lookup came back empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("class {0} not found")]
    ClassNotFound(String),

    #[error("no member of {class} matches")]
    NoMatch { class: String },
}
