//! Filesystem utilities

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::CatalogError;

/// Check if a file has the given extension (case-insensitive)
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Check if a path should be skipped during scanning
pub fn should_skip_path(path: &Path) -> bool {
    // Skip hidden files and directories
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('.') || name.starts_with('$')
        })
        .unwrap_or(false)
}

/// Recursively find media files under `root`, sorted by path
///
/// Anything below `exclude` (typically the output tree) is ignored, so a site
/// generated inside its own input directory is never rescanned.
pub fn scan_media_files(root: &Path, extension: &str, exclude: Option<&Path>) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() > 0 && should_skip_path(e.path()) {
                return false;
            }
            !matches!(exclude, Some(ex) if e.path().starts_with(ex))
        });

    let mut files: Vec<PathBuf> = walker
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), extension))
        .map(|e| e.into_path())
        .collect();

    // stable order is what makes file ids reproducible
    files.sort();
    files
}

/// Non-recursive listing of files with the given extension, sorted
pub fn list_files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_extension(p, extension))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Copy `src` to `dst`, carrying the source modification time over
pub fn copy_preserving_mtime(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst)?;
    let modified = fs::metadata(src)?.modified()?;
    fs::File::options().write(true).open(dst)?.set_modified(modified)?;
    Ok(())
}

/// Copy only if `dst` is missing or differs from `src` in size or mtime
///
/// Copies carry the source mtime, so an artifact matches its source exactly
/// until the source changes. A source older than the artifact also triggers
/// a copy: that happens when file ids shift onto a different input.
///
/// Returns whether a copy happened.
pub fn smart_copy(src: &Path, dst: &Path) -> io::Result<bool> {
    let dst_meta = match fs::metadata(dst) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            copy_preserving_mtime(src, dst)?;
            return Ok(true);
        }
        Err(e) => return Err(e),
    };
    let src_meta = fs::metadata(src)?;

    if src_meta.len() != dst_meta.len() || src_meta.modified()? != dst_meta.modified()? {
        copy_preserving_mtime(src, dst)?;
        return Ok(true);
    }

    Ok(false)
}

/// Names of files in `dir` with `extension` that are not in `keep`
pub fn find_orphans(dir: &Path, extension: &str, keep: &HashSet<String>) -> Vec<PathBuf> {
    list_files_with_extension(dir, extension)
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| !keep.contains(n))
                .unwrap_or(false)
        })
        .collect()
}

/// Mirror the directory tree at `src` into `dst` with smart copies
///
/// Returns the number of files actually copied.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() && smart_copy(entry.path(), &target)? {
            copied += 1;
        }
    }

    Ok(copied)
}

/// Canonical path of an existing directory
///
/// `kind` names the directory in the error ("input", "template").
pub fn require_dir(kind: &'static str, path: &Path) -> Result<PathBuf, CatalogError> {
    if !path.is_dir() {
        return Err(CatalogError::MissingDirectory {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(path.canonicalize()?)
}

/// Check if `path` is `ancestor` or lies inside it
pub fn is_same_or_inside(path: &Path, ancestor: &Path) -> bool {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let ancestor = ancestor
        .canonicalize()
        .unwrap_or_else(|_| ancestor.to_path_buf());
    path.starts_with(ancestor)
}
