use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("resource bundle {base_name} not found for locale '{locale}'")]
    NotFound { base_name: String, locale: String },

    #[error("failed to read resource bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
