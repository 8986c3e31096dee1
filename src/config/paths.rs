//! Path management for the generated site
//!
//! This module derives every output location and public URL from the output
//! root, so the builder, the sync step and the renderer agree on the layout.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::models::EntityKind;

/// Manages all filesystem paths of one output tree
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// Output root
    root: PathBuf,
    /// Extension of the copied media files
    extension: String,
}

impl OutputPaths {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.to_string(),
        }
    }

    /// Create the output root and its subdirectories if missing
    pub fn create_directories(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.static_dir(),
            self.media_dir(),
            self.entity_dir(EntityKind::Composer),
            self.entity_dir(EntityKind::Performer),
            self.files_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    // ========== Directories ==========

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Static assets copied from the template dir
    pub fn static_dir(&self) -> PathBuf {
        self.root.join("static")
    }

    /// Flat directory of copied media keyed by file id
    pub fn media_dir(&self) -> PathBuf {
        self.root.join("midi-files")
    }

    /// Per-entity page directory
    pub fn entity_dir(&self, kind: EntityKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Per-file page directory
    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    // ========== Artifacts ==========

    pub fn media_extension(&self) -> &str {
        &self.extension
    }

    /// File name of a media artifact
    pub fn media_file_name(&self, file_id: &str) -> String {
        format!("{}.{}", file_id, self.extension)
    }

    pub fn media_path(&self, file_id: &str) -> PathBuf {
        self.media_dir().join(self.media_file_name(file_id))
    }

    pub fn entity_page_path(&self, kind: EntityKind, slug: &str) -> PathBuf {
        self.entity_dir(kind).join(format!("{}.html", slug))
    }

    pub fn file_page_path(&self, file_id: &str) -> PathBuf {
        self.files_dir().join(format!("{}.html", file_id))
    }

    // ========== URLs ==========

    pub fn media_url(&self, file_id: &str) -> String {
        format!("/midi-files/{}", self.media_file_name(file_id))
    }

    pub fn file_page_url(&self, file_id: &str) -> String {
        format!("/files/{}.html", file_id)
    }
}
