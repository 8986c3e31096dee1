//! Build configuration
//!
//! Settings come from an optional JSON file; every field has a default so a
//! partial file (or none at all) is valid. CLI flags are applied on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the output artifact directory is kept in step with the input set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Create missing directories, copy changed files, remove orphans
    #[default]
    Incremental,
    /// Wipe the output tree and copy everything every run
    FullRebuild,
}

/// Where file metadata is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataSource {
    /// Filename patterns only
    #[default]
    Filename,
    /// Embedded title/copyright fields first, then filename patterns
    EmbeddedFirst,
}

/// Build configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Extension of the scanned media files
    #[serde(default = "default_media_extension")]
    pub media_extension: String,

    /// Output synchronization policy
    #[serde(default)]
    pub sync_policy: SyncPolicy,

    /// Metadata source
    #[serde(default)]
    pub metadata_source: MetadataSource,

    /// Enrichment cache file, relative paths resolve against the input dir
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Persisted name registry, relative paths resolve against the input dir
    #[serde(default = "default_registry_file")]
    pub registry_file: PathBuf,

    /// Extra plain-text name lists
    #[serde(default)]
    pub registry_sources: Vec<PathBuf>,

    /// Convert top-level PDFs in the input dir and scan them for names
    #[serde(default = "default_true")]
    pub scan_pdfs: bool,

    /// Command used to turn a PDF into text
    #[serde(default = "default_pdftotext_command")]
    pub pdftotext_command: String,

    /// User agent sent to the knowledge source
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page summary endpoint (title is appended as a path segment)
    #[serde(default = "default_wiki_summary_endpoint")]
    pub wiki_summary_endpoint: String,

    /// MediaWiki action API endpoint
    #[serde(default = "default_wiki_api_endpoint")]
    pub wiki_api_endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Show a progress bar while processing files
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            media_extension: default_media_extension(),
            sync_policy: SyncPolicy::default(),
            metadata_source: MetadataSource::default(),
            cache_file: default_cache_file(),
            registry_file: default_registry_file(),
            registry_sources: Vec::new(),
            scan_pdfs: true,
            pdftotext_command: default_pdftotext_command(),
            user_agent: default_user_agent(),
            wiki_summary_endpoint: default_wiki_summary_endpoint(),
            wiki_api_endpoint: default_wiki_api_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            show_progress: true,
        }
    }
}

impl BuildConfig {
    /// Load configuration from a settings file, or defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let config: BuildConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;

        Ok(config)
    }

    /// Extension without a leading dot, lowercased
    pub fn extension(&self) -> String {
        self.media_extension.trim_start_matches('.').to_lowercase()
    }

    /// Absolute cache file location for an input dir
    pub fn cache_path(&self, input_dir: &Path) -> PathBuf {
        resolve(input_dir, &self.cache_file)
    }

    /// Absolute registry file location for an input dir
    pub fn registry_path(&self, input_dir: &Path) -> PathBuf {
        resolve(input_dir, &self.registry_file)
    }

    /// Absolute locations of the extra text sources
    pub fn registry_source_paths(&self, input_dir: &Path) -> Vec<PathBuf> {
        self.registry_sources
            .iter()
            .map(|p| resolve(input_dir, p))
            .collect()
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_media_extension() -> String {
    "mid".to_string()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(".wikipedia_cache.json")
}

fn default_registry_file() -> PathBuf {
    PathBuf::from("pianists.csv")
}

fn default_pdftotext_command() -> String {
    "pdftotext".to_string()
}

fn default_user_agent() -> String {
    format!(
        "MIDI-Library-Generator/{} (static site generator)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_wiki_summary_endpoint() -> String {
    "https://en.wikipedia.org/api/rest_v1/page/summary".to_string()
}

fn default_wiki_api_endpoint() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}
