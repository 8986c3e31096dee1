//! Metadata extraction - (work, composer, performer) for one media file
//!
//! Embedded fields, when enabled, pre-populate the result; the filename
//! cascade fills whatever is still missing; fixed fallbacks finish the job.
//! Extraction never fails and is a pure function of stem + embedded fields.

use lofty::{Accessor, ItemKey, Probe, TaggedFileExt};
use std::path::Path;

use crate::config::MetadataSource;
use crate::models::{EntityKind, FileMetadata};
use crate::utils::filesystem::has_extension;
use crate::utils::parsers::{apply_filename_patterns, extract_attribution, Field, PartialMetadata};

use super::midi_meta::read_midi_fields;

/// Work title used when even the stem is blank
pub const UNTITLED_WORK: &str = "Untitled";

/// Text fields embedded in a media file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedFields {
    pub title: Option<String>,
    pub copyright: Option<String>,
}

/// Resolve metadata from a filename stem and optional embedded fields
pub fn extract_metadata(stem: &str, embedded: Option<&EmbeddedFields>) -> FileMetadata {
    let mut partial = PartialMetadata::default();

    if let Some(fields) = embedded {
        if let Some(title) = &fields.title {
            partial.fill(Field::Work, title);
        }
        if let Some(name) = fields.copyright.as_deref().and_then(extract_attribution) {
            partial.fill(Field::Composer, &name);
        }
    }

    apply_filename_patterns(stem, &mut partial);

    let stem = stem.trim();
    FileMetadata {
        work: partial.work.unwrap_or_else(|| {
            if stem.is_empty() {
                UNTITLED_WORK.to_string()
            } else {
                stem.to_string()
            }
        }),
        composer: partial
            .composer
            .unwrap_or_else(|| EntityKind::Composer.unknown_name().to_string()),
        performer: partial
            .performer
            .unwrap_or_else(|| EntityKind::Performer.unknown_name().to_string()),
    }
}

/// Read embedded fields from a media file; unreadable files yield none
pub fn read_embedded_fields(path: &Path) -> Option<EmbeddedFields> {
    let result = if has_extension(path, "mid") || has_extension(path, "midi") {
        read_midi_fields(path)
    } else {
        read_tag_fields(path)
    };

    match result {
        Ok(fields) => Some(fields),
        Err(e) => {
            tracing::debug!("no embedded metadata in {}: {}", path.display(), e);
            None
        }
    }
}

/// Title and copyright from a tagged audio file via lofty
fn read_tag_fields(path: &Path) -> anyhow::Result<EmbeddedFields> {
    let tagged_file = Probe::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open file: {}", e))?
        .read()
        .map_err(|e| anyhow::anyhow!("failed to read tags: {}", e))?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(EmbeddedFields {
        title: tag.and_then(|t| t.title().map(|s| s.to_string())),
        copyright: tag.and_then(|t| {
            t.get_string(&ItemKey::CopyrightMessage)
                .map(|s| s.to_string())
        }),
    })
}

/// Extracts metadata for files according to the configured source
#[derive(Debug, Clone, Copy)]
pub struct MetadataExtractor {
    source: MetadataSource,
}

impl MetadataExtractor {
    pub fn new(source: MetadataSource) -> Self {
        Self { source }
    }

    pub fn extract(&self, path: &Path) -> FileMetadata {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let embedded = match self.source {
            MetadataSource::Filename => None,
            MetadataSource::EmbeddedFirst => read_embedded_fields(path),
        };

        extract_metadata(&stem, embedded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::midi_meta::tests::{meta, midi_with_track};
    use tempfile::TempDir;

    #[test]
    fn test_pattern_precedence() {
        let m = extract_metadata("Bach - Busoni - Chaconne", None);
        assert_eq!(m.composer, "Bach");
        assert_eq!(m.performer, "Busoni");
        assert_eq!(m.work, "Chaconne");

        let m = extract_metadata("Nocturne by Chopin", None);
        assert_eq!(m.work, "Nocturne");
        assert_eq!(m.composer, "Chopin");
        assert_eq!(m.performer, "Unknown Performer");
    }

    #[test]
    fn test_fallbacks_always_populate() {
        let stems = ["", "   ", "Improvisation", " - ", "_", "(x)", "a by", "日本の歌"];
        for stem in stems {
            let m = extract_metadata(stem, None);
            assert!(!m.work.is_empty(), "empty work for {:?}", stem);
            assert!(!m.composer.is_empty(), "empty composer for {:?}", stem);
            assert!(!m.performer.is_empty(), "empty performer for {:?}", stem);
        }

        let m = extract_metadata("Improvisation", None);
        assert_eq!(m.work, "Improvisation");
        assert_eq!(m.composer, "Unknown Composer");

        assert_eq!(extract_metadata("", None).work, UNTITLED_WORK);
    }

    #[test]
    fn test_embedded_fields_come_first() {
        let embedded = EmbeddedFields {
            title: Some("Chaconne BWV 1004".into()),
            copyright: Some("Copyright 1999 by J. S. Bach".into()),
        };
        let m = extract_metadata("Liszt - Horowitz - Something", Some(&embedded));
        assert_eq!(m.work, "Chaconne BWV 1004");
        assert_eq!(m.composer, "J. S. Bach");
        assert_eq!(m.performer, "Horowitz");
    }

    #[test]
    fn test_unrecognized_copyright_falls_through() {
        let embedded = EmbeddedFields {
            title: None,
            copyright: Some("Public domain".into()),
        };
        let m = extract_metadata("Satie - Gymnopedie", Some(&embedded));
        assert_eq!(m.composer, "Satie");
        assert_eq!(m.work, "Gymnopedie");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let a = extract_metadata("Sonata (Mozart) Vladimir Horowitz 1965", None);
        let b = extract_metadata("Sonata (Mozart) Vladimir Horowitz 1965", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_extractor_reads_midi_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("track01.mid");
        let mut events = meta(0x03, "Kinderszenen");
        events.extend(meta(0x02, "(c) by Robert Schumann"));
        std::fs::write(&path, midi_with_track(&events)).unwrap();

        let m = MetadataExtractor::new(MetadataSource::EmbeddedFirst).extract(&path);
        assert_eq!(m.work, "Kinderszenen");
        assert_eq!(m.composer, "Robert Schumann");

        let m = MetadataExtractor::new(MetadataSource::Filename).extract(&path);
        assert_eq!(m.work, "track01");
        assert_eq!(m.composer, "Unknown Composer");
    }

    #[test]
    fn test_unreadable_embedded_degrades_to_filename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Chopin - Etude.mid");
        std::fs::write(&path, b"garbage").unwrap();

        let m = MetadataExtractor::new(MetadataSource::EmbeddedFirst).extract(&path);
        assert_eq!(m.composer, "Chopin");
        assert_eq!(m.work, "Etude");
    }
}
