//! Text parsing utilities for filename metadata

use lazy_static::lazy_static;
use regex::Regex;

/// Which metadata field a capture group fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Work,
    Composer,
    Performer,
}

impl Field {
    fn group_name(self) -> &'static str {
        match self {
            Field::Work => "work",
            Field::Composer => "composer",
            Field::Performer => "performer",
        }
    }
}

/// One row of the filename cascade
pub struct FilenamePattern {
    pub name: &'static str,
    pub regex: Regex,
    pub fields: &'static [Field],
}

impl FilenamePattern {
    fn new(name: &'static str, pattern: &str, fields: &'static [Field]) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
            fields,
        }
    }
}

lazy_static! {
    // Ordered from most specific to least specific
    pub static ref FILENAME_PATTERNS: Vec<FilenamePattern> = vec![
        FilenamePattern::new(
            "composer-performer-work",
            r"^(?P<composer>.+?)\s+-\s+(?P<performer>.+?)\s+-\s+(?P<work>.+?)$",
            &[Field::Composer, Field::Performer, Field::Work],
        ),
        FilenamePattern::new(
            "composer-work",
            r"^(?P<composer>.+?)\s+-\s+(?P<work>.+?)$",
            &[Field::Composer, Field::Work],
        ),
        FilenamePattern::new(
            "work-by-composer",
            r"^(?P<work>.+?)\s+by\s+(?P<composer>.+?)$",
            &[Field::Work, Field::Composer],
        ),
        FilenamePattern::new(
            "work-paren-composer",
            r"^(?P<work>.+?)\s+\((?P<composer>.+?)\)$",
            &[Field::Work, Field::Composer],
        ),
        FilenamePattern::new(
            "composer_work",
            r"^(?P<composer>[^_]+)_(?P<work>.+)$",
            &[Field::Composer, Field::Work],
        ),
        FilenamePattern::new(
            "work-paren-composer-performer-tail",
            r"^(?P<work>.+?)\s+\((?P<composer>.+?)\)\s+(?P<performer>.+)\s+\S+$",
            &[Field::Work, Field::Composer, Field::Performer],
        ),
        FilenamePattern::new("work-only", r"^(?P<work>.+)$", &[Field::Work]),
    ];

    // "... by Name, all rights reserved" style attribution
    static ref ATTRIBUTION_PATTERN: Regex =
        Regex::new(r"(?i)\bby\s+([^,;()\r\n]+)").unwrap();
}

/// Partially resolved metadata while the cascade runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    pub work: Option<String>,
    pub composer: Option<String>,
    pub performer: Option<String>,
}

impl PartialMetadata {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Work => &mut self.work,
            Field::Composer => &mut self.composer,
            Field::Performer => &mut self.performer,
        }
    }

    /// Set a field unless it already holds a value; blank values are ignored
    pub fn fill(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = self.slot(field);
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    /// The cascade may stop once these two are known
    pub fn has_essentials(&self) -> bool {
        self.work.is_some() && self.composer.is_some()
    }
}

/// Run the filename cascade on top of whatever is already resolved
///
/// Fields already set are never overwritten.
pub fn apply_filename_patterns(stem: &str, metadata: &mut PartialMetadata) {
    for pattern in FILENAME_PATTERNS.iter() {
        let Some(caps) = pattern.regex.captures(stem) else {
            continue;
        };

        for field in pattern.fields {
            if let Some(value) = caps.name(field.group_name()) {
                metadata.fill(*field, value.as_str());
            }
        }

        tracing::trace!("pattern {} matched {:?}", pattern.name, stem);

        // stop once work and composer are known
        if metadata.has_essentials() {
            break;
        }
    }
}

/// Pull the attributed name out of a copyright-style string
pub fn extract_attribution(text: &str) -> Option<String> {
    let caps = ATTRIBUTION_PATTERN.captures(text)?;
    let name = caps
        .get(1)?
        .as_str()
        .trim()
        .trim_end_matches('.')
        .trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
