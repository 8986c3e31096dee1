//! Slug utilities
//!
//! Every catalog identity (composer, performer, registry key) is a slug:
//! ASCII, lowercase, hyphen-separated.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Anything that is not a letter, digit, whitespace or hyphen
    static ref DISALLOWED: Regex = Regex::new(r"[^A-Za-z0-9\s-]").unwrap();

    // Runs of whitespace and hyphens collapse into one hyphen
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[\s-]+").unwrap();
}

/// Convert display text into a slug
///
/// # Arguments
/// * `text` - Arbitrary Unicode display text
///
/// # Returns
/// The slug, possibly empty when the text has no ASCII residue
pub fn slugify(text: &str) -> String {
    // decompose so accents split off their base letters, then drop the residue
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();

    let cleaned = DISALLOWED.replace_all(&ascii, "");
    let lowered = cleaned.trim().to_lowercase();

    SEPARATOR_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug used as an entity key, substituting `fallback` when the name has no
/// ASCII residue
pub fn entity_slug(name: &str, fallback: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        slugify(fallback)
    } else {
        slug
    }
}
