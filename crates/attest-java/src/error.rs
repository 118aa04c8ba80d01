use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum JavaError {
    #[error("failed to load the Java grammar: {0}")]
    Grammar(String),

    #[error("failed to parse {path}")]
    Parse { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),
}
