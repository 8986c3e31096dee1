//! Catalog pipeline: registry, metadata, enrichment, sync, rendering

pub mod catalog;
pub mod enrichment;
pub mod metadata;
pub mod midi_meta;
pub mod registry;
pub mod render;
pub mod sync;

pub use catalog::{BuildStats, CatalogBuilder};
pub use enrichment::{CacheEntry, EnrichmentCache};
pub use metadata::{extract_metadata, EmbeddedFields, MetadataExtractor};
pub use registry::{NameRecord, NameRegistry};
pub use render::{Renderer, TemplateRenderer};
pub use sync::ArtifactSync;
