//! Catalog builder - turns the discovered input set into the catalog model
//!
//! Pipeline per run:
//! - metadata extraction for every file (parallel, collected in discovery order)
//! - file id assignment from the discovery index
//! - composer/performer upsert keyed by slug, enrichment on first sight
//! - artifact sync for each file, then orphan cleanup
//! - playlist recomputation

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::models::{file_id, Catalog, CatalogFile, Entity, EntityKind, FileMetadata};
use crate::utils::slug::entity_slug;

use super::enrichment::EnrichmentCache;
use super::metadata::MetadataExtractor;
use super::registry::NameRegistry;
use super::sync::ArtifactSync;

/// Counters reported at the end of a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files: usize,
    pub copied: usize,
    pub orphans_removed: usize,
}

pub struct CatalogBuilder<'a> {
    registry: &'a NameRegistry,
    cache: &'a EnrichmentCache,
    extractor: MetadataExtractor,
    sync: &'a ArtifactSync,
    show_progress: bool,
    stats: BuildStats,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(
        registry: &'a NameRegistry,
        cache: &'a EnrichmentCache,
        extractor: MetadataExtractor,
        sync: &'a ArtifactSync,
    ) -> Self {
        Self {
            registry,
            cache,
            extractor,
            sync,
            show_progress: false,
            stats: BuildStats::default(),
        }
    }

    /// set whether to show progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Build the catalog for `files`, which must already be in discovery order
    pub async fn build(&mut self, files: &[PathBuf]) -> Result<Catalog> {
        self.stats = BuildStats {
            files: files.len(),
            ..BuildStats::default()
        };

        let extracted = self.extract_all(files);
        let mut catalog = Catalog::default();

        for (index, (path, metadata)) in files.iter().zip(extracted).enumerate() {
            let id = file_id(index);
            debug!(
                "{} -> work={:?} composer={:?} performer={:?}",
                path.display(),
                metadata.work,
                metadata.composer,
                metadata.performer
            );
            self.add_file(&mut catalog, id, path, metadata).await?;
        }

        self.stats.orphans_removed = self
            .sync
            .remove_orphans(catalog.files.keys().map(String::as_str))
            .context("Orphan cleanup failed")?;

        catalog.rebuild_playlists();

        info!(
            "Catalog: {} files, {} composers, {} performers ({} copied, {} orphans removed)",
            catalog.files.len(),
            catalog.composers.len(),
            catalog.performers.len(),
            self.stats.copied,
            self.stats.orphans_removed
        );

        Ok(catalog)
    }

    /// Extract metadata for every file using rayon, keeping input order
    fn extract_all(&self, files: &[PathBuf]) -> Vec<FileMetadata> {
        let total = files.len() as u64;
        let progress = if self.show_progress && total > 0 {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            Some(pb)
        } else {
            None
        };

        let processed = AtomicU64::new(0);
        let extractor = self.extractor;

        let results: Vec<FileMetadata> = files
            .par_iter()
            .map(|path| {
                let metadata = extractor.extract(path);
                let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(pb) = &progress {
                    pb.set_position(count);
                }
                metadata
            })
            .collect();

        if let Some(pb) = progress {
            pb.finish_with_message(format!("read {} files", results.len()));
        }

        results
    }

    async fn add_file(
        &mut self,
        catalog: &mut Catalog,
        id: String,
        path: &Path,
        metadata: FileMetadata,
    ) -> Result<()> {
        let composer_slug = entity_slug(&metadata.composer, EntityKind::Composer.unknown_name());
        // slug comes from the extracted name; the registry only changes the display name
        let performer_slug = entity_slug(&metadata.performer, EntityKind::Performer.unknown_name());
        let performer_display = self
            .registry
            .get(&performer_slug)
            .map(str::to_string)
            .unwrap_or_else(|| metadata.performer.clone());

        self.upsert_entity(
            catalog,
            EntityKind::Composer,
            &composer_slug,
            &metadata.composer,
            &metadata.composer,
            &id,
        )
        .await?;
        self.upsert_entity(
            catalog,
            EntityKind::Performer,
            &performer_slug,
            &metadata.performer,
            &performer_display,
            &id,
        )
        .await?;

        if self.sync.sync_file(path, &id)? {
            self.stats.copied += 1;
        }

        let paths = self.sync.paths();
        let file = CatalogFile {
            id: id.clone(),
            title: metadata.work,
            composer_slug,
            performer_slug,
            page_url: paths.file_page_url(&id),
            media_url: paths.media_url(&id),
            source_path: path.to_path_buf(),
            output_path: paths.media_path(&id),
        };
        catalog.files.insert(id, file);

        Ok(())
    }

    /// Append `file_id` to the entity, creating and enriching it on first sight
    ///
    /// `lookup_name` keys the enrichment cache; `display_name` is what the
    /// entity shows.
    async fn upsert_entity(
        &self,
        catalog: &mut Catalog,
        kind: EntityKind,
        slug: &str,
        lookup_name: &str,
        display_name: &str,
        file_id: &str,
    ) -> Result<()> {
        if let Some(entity) = catalog.entities_mut(kind).get_mut(slug) {
            entity.works.push(file_id.to_string());
            return Ok(());
        }

        let enrichment = self
            .cache
            .get_entity_data(lookup_name, kind)
            .await
            .with_context(|| format!("Failed to enrich {} {}", kind, lookup_name))?;

        let mut entity = Entity::new(kind, slug.to_string(), display_name.to_string(), enrichment);
        entity.works.push(file_id.to_string());
        catalog.entities_mut(kind).insert(slug.to_string(), entity);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MetadataSource, OutputPaths, SyncPolicy};
    use crate::core::enrichment::testing::ScriptedSource;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        source: Arc<ScriptedSource>,
        cache: EnrichmentCache,
        sync: ArtifactSync,
    }

    impl Fixture {
        fn new(source: ScriptedSource) -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("music")).unwrap();
            let source = Arc::new(source);
            let cache = EnrichmentCache::load(dir.path().join("cache.json"), source.clone());
            let sync = ArtifactSync::new(
                SyncPolicy::Incremental,
                OutputPaths::new(dir.path().join("site"), "mid"),
            );
            sync.prepare(&[]).unwrap();
            Self { dir, source, cache, sync }
        }

        fn add_input(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join("music").join(name);
            fs::write(&path, name.as_bytes()).unwrap();
            path
        }
    }

    #[tokio::test]
    async fn test_entities_are_deduplicated_by_slug() {
        let fx = Fixture::new(ScriptedSource::new());
        let files = vec![
            fx.add_input("Bach - Busoni - Chaconne.mid"),
            fx.add_input("bach - Busoni - Toccata.mid"),
        ];
        let registry = NameRegistry::new();
        let mut builder = CatalogBuilder::new(
            &registry,
            &fx.cache,
            MetadataExtractor::new(MetadataSource::Filename),
            &fx.sync,
        );

        let catalog = builder.build(&files).await.unwrap();

        assert_eq!(catalog.composers.len(), 1);
        let bach = &catalog.composers["bach"];
        assert_eq!(bach.name, "Bach");
        assert_eq!(bach.works, vec!["file-id-000000", "file-id-000001"]);
        assert_eq!(catalog.files["file-id-000001"].title, "Toccata");
        assert_eq!(catalog.playlists["performer-busoni"].len(), 2);

        // one composer and one performer were looked up, each once
        assert_eq!(fx.cache.fetch_count(), 2);
        assert_eq!(builder.stats().copied, 2);
    }

    #[tokio::test]
    async fn test_registry_substitutes_performer_display_name() {
        let fx = Fixture::new(ScriptedSource::new().with_page("Busoni", "Ferruccio Busoni", "Pianist."));
        let files = vec![fx.add_input("Bach - Busoni - Chaconne.mid")];
        let mut registry = NameRegistry::new();
        registry.insert_first("busoni".into(), "Ferruccio Busoni (1866-1924)".into());

        let mut builder = CatalogBuilder::new(
            &registry,
            &fx.cache,
            MetadataExtractor::new(MetadataSource::Filename),
            &fx.sync,
        );
        let catalog = builder.build(&files).await.unwrap();

        let busoni = &catalog.performers["busoni"];
        assert_eq!(busoni.slug, "busoni");
        assert_eq!(busoni.name, "Ferruccio Busoni (1866-1924)");
        assert_eq!(busoni.enrichment.summary, "Pianist.");

        // cache keyed on the name from the filename
        assert!(fx.cache.peek(EntityKind::Performer, "Busoni").is_some());
        assert!(fx
            .cache
            .peek(EntityKind::Performer, "Ferruccio Busoni (1866-1924)")
            .is_none());
        assert!(fx.source.queries.lock().iter().all(|q| !q.contains("1866")));
    }

    #[tokio::test]
    async fn test_fallback_entities_and_urls() {
        let fx = Fixture::new(ScriptedSource::new());
        let files = vec![fx.add_input("Improvisation.mid")];
        let registry = NameRegistry::new();
        let mut builder = CatalogBuilder::new(
            &registry,
            &fx.cache,
            MetadataExtractor::new(MetadataSource::Filename),
            &fx.sync,
        );
        let catalog = builder.build(&files).await.unwrap();

        let file = &catalog.files["file-id-000000"];
        assert_eq!(file.composer_slug, "unknown-composer");
        assert_eq!(file.performer_slug, "unknown-performer");
        assert_eq!(file.page_url, "/files/file-id-000000.html");
        assert_eq!(file.media_url, "/midi-files/file-id-000000.mid");
        assert!(file.output_path.exists());
        assert_eq!(catalog.composers["unknown-composer"].page_url, "/composers/unknown-composer.html");
    }
}
