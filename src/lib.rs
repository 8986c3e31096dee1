//! midi-library - static site generator for a MIDI file collection
//!
//! Builds a composer/performer/work catalog from loosely named media files,
//! enriches entities from Wikipedia through a persistent cache, keeps an
//! output artifact tree in sync and renders the pages.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod plugins;
pub mod utils;

pub use crate::core::{ArtifactSync, CatalogBuilder, EnrichmentCache, MetadataExtractor, NameRegistry};
pub use error::{CatalogError, LookupError};
