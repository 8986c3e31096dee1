//! Output artifact synchronization
//!
//! Two policies keep the output tree consistent with the input set:
//! - full rebuild: wipe the tree, copy everything again
//! - incremental: copy only changed inputs, then delete orphaned artifacts

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{OutputPaths, SyncPolicy};
use crate::error::CatalogError;
use crate::utils::filesystem::{copy_preserving_mtime, copy_tree, find_orphans, is_same_or_inside, smart_copy};

pub struct ArtifactSync {
    policy: SyncPolicy,
    paths: OutputPaths,
}

impl ArtifactSync {
    pub fn new(policy: SyncPolicy, paths: OutputPaths) -> Self {
        Self { policy, paths }
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Get the output tree ready for a run
    ///
    /// `protected` lists directories that must survive a wipe; a full rebuild
    /// whose output root is or contains one of them is refused.
    pub fn prepare(&self, protected: &[(&'static str, &Path)]) -> Result<()> {
        let root = self.paths.root();

        if self.policy == SyncPolicy::FullRebuild && root.exists() {
            for &(kind, dir) in protected {
                if is_same_or_inside(dir, root) {
                    return Err(CatalogError::UnsafeOutputDir {
                        kind,
                        path: root.to_path_buf(),
                    }
                    .into());
                }
            }

            info!("Full rebuild: removing {}", root.display());
            fs::remove_dir_all(root)
                .with_context(|| format!("Failed to remove {}", root.display()))?;
        }

        self.paths.create_directories()
    }

    /// Copy `<template>/static` into the output static dir
    pub fn copy_static_assets(&self, template_dir: &Path) -> Result<usize> {
        let src = template_dir.join("static");
        if !src.is_dir() {
            debug!("no static assets in {}", template_dir.display());
            return Ok(0);
        }

        let dst = self.paths.static_dir();
        let copied = copy_tree(&src, &dst)
            .with_context(|| format!("Failed to copy static assets to {}", dst.display()))?;
        info!("Copied {} static asset(s)", copied);
        Ok(copied)
    }

    /// Place the artifact for one input file; returns whether bytes were copied
    pub fn sync_file(&self, source: &Path, file_id: &str) -> Result<bool> {
        let dst = self.paths.media_path(file_id);

        let copied = match self.policy {
            SyncPolicy::FullRebuild => {
                copy_preserving_mtime(source, &dst).map(|_| true)
            }
            SyncPolicy::Incremental => smart_copy(source, &dst),
        }
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dst.display()))?;

        if copied {
            info!("Copied {} -> {}", source.display(), dst.display());
        } else {
            debug!("Unchanged: {}", dst.display());
        }

        Ok(copied)
    }

    /// Delete media artifacts whose file id is not in `current_ids`
    ///
    /// Only meaningful for the incremental policy; a full rebuild starts from
    /// an empty tree and has nothing to clean.
    pub fn remove_orphans<'a>(&self, current_ids: impl IntoIterator<Item = &'a str>) -> Result<usize> {
        if self.policy == SyncPolicy::FullRebuild {
            return Ok(0);
        }

        let keep: HashSet<String> = current_ids
            .into_iter()
            .map(|id| self.paths.media_file_name(id))
            .collect();

        let orphans = find_orphans(&self.paths.media_dir(), self.paths.media_extension(), &keep);
        for orphan in &orphans {
            fs::remove_file(orphan)
                .with_context(|| format!("Failed to remove orphan {}", orphan.display()))?;
            info!("Removed orphaned artifact {}", orphan.display());
        }

        Ok(orphans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sync_in(dir: &TempDir, policy: SyncPolicy) -> ArtifactSync {
        ArtifactSync::new(policy, OutputPaths::new(dir.path().join("site"), "mid"))
    }

    #[test]
    fn test_prepare_creates_layout() {
        let dir = TempDir::new().unwrap();
        let sync = sync_in(&dir, SyncPolicy::Incremental);
        sync.prepare(&[]).unwrap();

        let site = dir.path().join("site");
        for sub in ["static", "midi-files", "composers", "performers", "files"] {
            assert!(site.join(sub).is_dir(), "missing {}", sub);
        }
    }

    #[test]
    fn test_full_rebuild_wipes_stale_files() {
        let dir = TempDir::new().unwrap();
        let sync = sync_in(&dir, SyncPolicy::FullRebuild);
        sync.prepare(&[]).unwrap();

        let stale = dir.path().join("site/midi-files/file-id-000009.mid");
        fs::write(&stale, b"old").unwrap();
        sync.prepare(&[]).unwrap();
        assert!(!stale.exists());
        assert!(dir.path().join("site/midi-files").is_dir());
    }

    #[test]
    fn test_full_rebuild_refuses_to_wipe_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("site/music");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("keep.mid"), b"data").unwrap();

        let sync = sync_in(&dir, SyncPolicy::FullRebuild);
        let err = sync.prepare(&[("input", input.as_path())]).unwrap_err();
        assert!(err.to_string().contains("input"));
        assert!(input.join("keep.mid").exists());
    }

    #[test]
    fn test_incremental_sync_and_orphans() {
        let dir = TempDir::new().unwrap();
        let sync = sync_in(&dir, SyncPolicy::Incremental);
        sync.prepare(&[]).unwrap();

        let a = dir.path().join("a.mid");
        let b = dir.path().join("b.mid");
        fs::write(&a, b"aaa").unwrap();
        fs::write(&b, b"bbb").unwrap();

        assert!(sync.sync_file(&a, "file-id-000000").unwrap());
        assert!(sync.sync_file(&b, "file-id-000001").unwrap());
        let artifact = dir.path().join("site/midi-files/file-id-000000.mid");
        let before = fs::metadata(&artifact).unwrap().modified().unwrap();

        assert!(!sync.sync_file(&a, "file-id-000000").unwrap());
        assert_eq!(sync.remove_orphans(["file-id-000000"]).unwrap(), 1);

        assert!(!dir.path().join("site/midi-files/file-id-000001.mid").exists());
        assert_eq!(fs::metadata(&artifact).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn test_copy_static_assets() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("templates");
        fs::create_dir_all(template.join("static/img")).unwrap();
        fs::write(template.join("static/img/logo.svg"), b"<svg/>").unwrap();

        let sync = sync_in(&dir, SyncPolicy::Incremental);
        sync.prepare(&[]).unwrap();
        assert_eq!(sync.copy_static_assets(&template).unwrap(), 1);
        assert!(dir.path().join("site/static/img/logo.svg").exists());
    }
}
