//! Name registry - slug to canonical display name
//!
//! Records come from lines shaped like `Name (1866-1924)` in plain-text lists
//! and in text converted from PDF documents. Each record is registered under
//! the slug of its surname, so a performer written as just `Busoni` in a
//! filename resolves to `Ferruccio Busoni (1866-1924)`.
//!
//! Precedence: within one extraction pass the first record for a slug wins.
//! When merging, freshly extracted entries override the persisted table.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::utils::filesystem::{has_extension, list_files_with_extension};
use crate::utils::slug::slugify;

/// Second-to-last token that makes the surname a two-token compound
pub const COMPOUND_SURNAME_MARKER: &str = "d'albert";

/// Explicit synonym registered whenever the marker appears in a name
pub const COMPOUND_SURNAME_SYNONYM: &str = "d-albert";

lazy_static! {
    static ref NAME_RECORD_PATTERN: Regex =
        Regex::new(r"^(.+?)\s+\((\d{4}-\d{4})\)\s*$").unwrap();
}

/// One `Name (YYYY-YYYY)` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub full_name: String,
    pub years: String,
    pub display_name: String,
}

impl NameRecord {
    /// Parse a single line, ignoring surrounding whitespace
    pub fn parse(line: &str) -> Option<Self> {
        let caps = NAME_RECORD_PATTERN.captures(line.trim())?;
        let full_name = caps.get(1)?.as_str().trim().to_string();
        let years = caps.get(2)?.as_str().to_string();
        let display_name = format!("{} ({})", full_name, years);

        Some(Self {
            full_name,
            years,
            display_name,
        })
    }

    /// Surname used for lookup, with the particle heuristics applied
    pub fn surname(&self) -> String {
        let parts: Vec<&str> = self.full_name.split_whitespace().collect();
        let last = parts.last().copied().unwrap_or_default();

        match parts.len().checked_sub(2).map(|i| parts[i]) {
            Some(prev) if fold_apostrophes(prev).eq_ignore_ascii_case(COMPOUND_SURNAME_MARKER) => {
                format!("{} {}", prev, last)
            }
            Some(prev) if prev.eq_ignore_ascii_case("von") => format!("von {}", last),
            _ => last.to_string(),
        }
    }

    /// Every slug this record registers under, primary first
    pub fn lookup_slugs(&self) -> Vec<String> {
        let mut slugs = vec![slugify(&self.surname())];

        if fold_apostrophes(&self.full_name)
            .to_lowercase()
            .contains(COMPOUND_SURNAME_MARKER)
        {
            slugs.push(COMPOUND_SURNAME_SYNONYM.to_string());
        }

        slugs.retain(|s| !s.is_empty());
        slugs.dedup();
        slugs
    }
}

/// Typographic apostrophes (common in pdftotext output) as ASCII `'`
fn fold_apostrophes(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
}

/// One row of the persisted registry file
#[derive(Debug, Serialize, Deserialize)]
struct RegistryRow {
    #[serde(rename = "Slug")]
    slug: String,
    #[serde(rename = "DisplayName")]
    display_name: String,
}

/// Slug to display name table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    names: BTreeMap<String, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, slug: &str) -> Option<&str> {
        self.names.get(slug).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert unless the slug is already taken
    pub fn insert_first(&mut self, slug: String, display_name: String) -> bool {
        if self.names.contains_key(&slug) {
            return false;
        }
        self.names.insert(slug, display_name);
        true
    }

    /// Register every slug of a record, first occurrence wins
    pub fn add_record(&mut self, record: &NameRecord) {
        for slug in record.lookup_slugs() {
            self.insert_first(slug, record.display_name.clone());
        }
    }

    /// Scan every line of `text` for name records
    pub fn extend_from_text(&mut self, text: &str) -> usize {
        let mut found = 0;
        for record in text.lines().filter_map(NameRecord::parse) {
            self.add_record(&record);
            found += 1;
        }
        found
    }

    /// Build a registry from text sources, in order
    pub fn extract<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut registry = Self::new();
        for text in sources {
            registry.extend_from_text(text);
        }
        registry
    }

    /// Overlay `fresh` on top of `self`; fresh entries win on conflict
    pub fn merged_with(mut self, fresh: NameRegistry) -> Self {
        self.names.extend(fresh.names);
        self
    }

    /// Read a persisted `Slug,DisplayName` table
    pub fn load_csv(path: &Path) -> Result<Self, CatalogError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut registry = Self::new();

        for row in reader.deserialize::<RegistryRow>() {
            let row = row?;
            // later rows overwrite, matching a plain table load
            registry.names.insert(row.slug, row.display_name);
        }

        Ok(registry)
    }

    /// Persisted table, or an empty one when it is missing or unreadable
    pub fn load_csv_or_empty(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        match Self::load_csv(path) {
            Ok(registry) => {
                info!(
                    "Loaded {} registry entries from {}",
                    registry.len(),
                    path.display()
                );
                registry
            }
            Err(e) => {
                warn!("Ignoring unreadable registry file {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the table sorted by slug with a header row
    pub fn save_csv(&self, path: &Path) -> Result<(), CatalogError> {
        let mut writer = csv::Writer::from_path(path)?;
        for (slug, display_name) in &self.names {
            writer.serialize(RegistryRow {
                slug: slug.clone(),
                display_name: display_name.clone(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Read plain-text sources, skipping any that cannot be read
pub fn read_text_sources(paths: &[impl AsRef<Path>]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            match std::fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Skipping registry source {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

/// Convert every top-level PDF in `dir` to text with `pdftotext -layout`
pub fn convert_pdf_sources(dir: &Path, pdftotext: &str) -> Vec<String> {
    let pdfs = list_files_with_extension(dir, "pdf");
    if pdfs.is_empty() {
        info!("No PDF files found in {} for name extraction", dir.display());
        return Vec::new();
    }

    info!("Found {} PDF files. Extracting names...", pdfs.len());

    pdfs.iter()
        .filter_map(|pdf| convert_pdf(pdf, pdftotext))
        .collect()
}

/// Text of one PDF, or none (with a warning) when conversion fails
pub fn convert_pdf(pdf: &Path, pdftotext: &str) -> Option<String> {
    let output = Command::new(pdftotext)
        .arg("-layout")
        .arg(pdf)
        .arg("-")
        .output();

    match output {
        Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
        Ok(out) => {
            warn!(
                "Failed to convert {}: {} exited with {}",
                pdf.display(),
                pdftotext,
                out.status
            );
            None
        }
        Err(e) => {
            warn!("Failed to convert {}: {}", pdf.display(), e);
            None
        }
    }
}

/// Text of mixed sources: PDFs are converted, anything else is read as text
pub fn read_sources(paths: &[PathBuf], pdftotext: &str) -> Vec<String> {
    let (pdfs, texts): (Vec<&PathBuf>, Vec<&PathBuf>) =
        paths.iter().partition(|p| has_extension(p, "pdf"));

    let mut sources = read_text_sources(&texts);
    sources.extend(pdfs.iter().filter_map(|pdf| convert_pdf(pdf, pdftotext)));
    sources
}
