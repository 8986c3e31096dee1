//! Catalog file model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::FILE_ID_PREFIX;

/// Fully resolved metadata for one media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub work: String,
    pub composer: String,
    pub performer: String,
}

/// One media file in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Stable id, e.g. `file-id-000042`
    pub id: String,
    /// Work title
    pub title: String,
    pub composer_slug: String,
    pub performer_slug: String,
    /// Page URL for the renderer
    pub page_url: String,
    /// URL of the copied media artifact
    pub media_url: String,
    /// Original location in the input tree
    #[serde(skip)]
    pub source_path: PathBuf,
    /// Location of the copied artifact
    #[serde(skip)]
    pub output_path: PathBuf,
}

/// Format the zero-padded file id for a discovery index
pub fn file_id(index: usize) -> String {
    format!("{}{:06}", FILE_ID_PREFIX, index)
}
