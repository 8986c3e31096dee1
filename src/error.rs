//! Error types

use std::path::PathBuf;

/// Setup and persistence failures
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{kind} directory not found: {}", path.display())]
    MissingDirectory { kind: &'static str, path: PathBuf },
    #[error("refusing to wipe {} because it contains the {kind} directory", path.display())]
    UnsafeOutputDir { kind: &'static str, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Knowledge source failures
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}
