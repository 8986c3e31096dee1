//! Enrichment cache - read-through/write-through store of entity summaries
//!
//! Keys are `"<kind>:<name>"` using the name exactly as passed in. A hit never
//! touches the network. A miss walks a short list of queries against the
//! knowledge source, stores whatever came out (including a not-found
//! placeholder) and rewrites the whole cache file before returning.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::models::{Enrichment, EntityKind};
use crate::plugins::{KnowledgeSource, PageLookup};

/// Persisted value of one cache key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub name: String,
    pub summary: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<CacheEntry> for Enrichment {
    fn from(entry: CacheEntry) -> Self {
        Enrichment {
            summary: entry.summary,
            image_url: entry.image_url,
        }
    }
}

/// Cache key for an entity name
pub fn cache_key(kind: EntityKind, name: &str) -> String {
    format!("{}:{}", kind, name)
}

/// Summary stored when no query resolved
pub fn not_found_summary(name: &str) -> String {
    format!("No Wikipedia summary found for '{}'.", name)
}

/// Queries tried in order on a miss
fn lookup_queries(kind: EntityKind, name: &str) -> [String; 3] {
    [
        name.to_string(),
        format!("{} ({})", name, kind),
        format!("{} (musician)", name),
    ]
}

/// Persistent enrichment cache backed by a knowledge source
pub struct EnrichmentCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
    source: Arc<dyn KnowledgeSource>,
    fetches: AtomicUsize,
}

impl EnrichmentCache {
    /// Load the cache file; a missing or corrupt file starts an empty cache
    pub fn load(path: impl Into<PathBuf>, source: Arc<dyn KnowledgeSource>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);

        Self {
            path,
            entries: Mutex::new(entries),
            source,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of misses that went to the knowledge source in this process
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Stored entry for a key, without fetching
    pub fn peek(&self, kind: EntityKind, name: &str) -> Option<CacheEntry> {
        self.entries.lock().get(&cache_key(kind, name)).cloned()
    }

    /// Summary and image for an entity, fetching and persisting on a miss
    pub async fn get_entity_data(
        &self,
        name: &str,
        kind: EntityKind,
    ) -> Result<Enrichment, CatalogError> {
        let key = cache_key(kind, name);

        if let Some(entry) = self.entries.lock().get(&key).cloned() {
            info!("Cache HIT for: {}", name);
            return Ok(entry.into());
        }

        info!("Cache MISS for: {}. Fetching from Wikipedia...", name);
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let entry = self.fetch(name, kind).await;
        self.store(key, entry.clone())?;

        Ok(entry.into())
    }

    /// Walk the query list; never fails, the worst case is a placeholder
    async fn fetch(&self, name: &str, kind: EntityKind) -> CacheEntry {
        let mut found = None;

        for query in lookup_queries(kind, name) {
            match self.source.lookup_page(&query).await {
                Ok(PageLookup::Found(page)) => {
                    found = Some(page);
                    break;
                }
                Ok(PageLookup::Disambiguation) => {
                    tracing::debug!("'{}' is a disambiguation page, trying next query", query);
                }
                Ok(PageLookup::NotFound) => {
                    tracing::debug!("no page for '{}', trying next query", query);
                }
                Err(e) => {
                    warn!("Lookup for '{}' failed: {}", query, e);
                }
            }
        }

        let Some(page) = found else {
            return CacheEntry {
                name: name.to_string(),
                summary: not_found_summary(name),
                image_url: None,
            };
        };

        let image_url = match self.source.page_image(&page.title).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to fetch image for {}: {}", page.title, e);
                None
            }
        };

        CacheEntry {
            name: name.to_string(),
            summary: page.summary,
            image_url,
        }
    }

    /// Insert and write the full cache while holding the lock
    fn store(&self, key: String, entry: CacheEntry) -> Result<(), CatalogError> {
        let mut entries = self.entries.lock();
        entries.insert(key, entry);
        write_entries(&self.path, &entries)
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, CacheEntry> {
    if !path.exists() {
        return BTreeMap::new();
    }

    info!("Loading Wikipedia cache from {}", path.display());

    let parsed = std::fs::read_to_string(path)
        .map_err(CatalogError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(CatalogError::from));

    match parsed {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cache file {} is corrupt ({}). Starting fresh.", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Replace the cache file atomically with pretty-printed JSON
fn write_entries(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<(), CatalogError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, entries)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir, source: ScriptedSource) -> (EnrichmentCache, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let cache = EnrichmentCache::load(dir.path().join("cache.json"), source.clone());
        (cache, source)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = TempDir::new().unwrap();
        let (cache, source) = cache_in(
            &dir,
            ScriptedSource::new()
                .with_page("Chopin", "Frédéric Chopin", "Polish composer.")
                .with_image("Frédéric Chopin", "https://img/chopin.jpg"),
        );

        let first = cache.get_entity_data("Chopin", EntityKind::Composer).await.unwrap();
        assert_eq!(first.summary, "Polish composer.");
        assert_eq!(first.image_url.as_deref(), Some("https://img/chopin.jpg"));
        assert_eq!(source.query_count(), 1);

        let second = cache.get_entity_data("Chopin", EntityKind::Composer).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.query_count(), 1);
        assert_eq!(cache.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_disambiguation_tries_next_query() {
        let dir = TempDir::new().unwrap();
        let (cache, source) = cache_in(
            &dir,
            ScriptedSource::new()
                .with_disambiguation("Bach")
                .with_page("Bach (composer)", "Johann Sebastian Bach", "German composer."),
        );

        let data = cache.get_entity_data("Bach", EntityKind::Composer).await.unwrap();
        assert_eq!(data.summary, "German composer.");
        assert_eq!(
            *source.queries.lock(),
            vec!["Bach".to_string(), "Bach (composer)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_network_error_moves_on() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(
            &dir,
            ScriptedSource::new()
                .with_network_error("Horowitz")
                .with_network_error("Horowitz (performer)")
                .with_page("Horowitz (musician)", "Vladimir Horowitz", "Pianist."),
        );

        let data = cache.get_entity_data("Horowitz", EntityKind::Performer).await.unwrap();
        assert_eq!(data.summary, "Pianist.");
    }

    #[tokio::test]
    async fn test_confirmed_miss_is_cached_and_persisted() {
        let dir = TempDir::new().unwrap();
        let (cache, source) = cache_in(&dir, ScriptedSource::new());

        let data = cache.get_entity_data("Nobody", EntityKind::Performer).await.unwrap();
        assert_eq!(data.summary, not_found_summary("Nobody"));
        assert_eq!(data.image_url, None);
        assert_eq!(source.query_count(), 3);

        // a fresh instance over the same file does not retry
        let (reloaded, source) = cache_in(&dir, ScriptedSource::new());
        reloaded.get_entity_data("Nobody", EntityKind::Performer).await.unwrap();
        assert_eq!(source.query_count(), 0);
        assert_eq!(reloaded.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_image_failure_still_caches_summary() {
        let dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::new().with_page("Liszt", "Franz Liszt", "Hungarian composer.");
        source.fail_images = true;
        let (cache, _) = cache_in(&dir, source);

        let data = cache.get_entity_data("Liszt", EntityKind::Composer).await.unwrap();
        assert_eq!(data.summary, "Hungarian composer.");
        assert_eq!(data.image_url, None);
        assert!(cache.peek(EntityKind::Composer, "Liszt").is_some());
    }

    #[tokio::test]
    async fn test_kinds_have_independent_entries() {
        let dir = TempDir::new().unwrap();
        let (cache, source) = cache_in(
            &dir,
            ScriptedSource::new()
                .with_disambiguation("Rachmaninoff")
                .with_page("Rachmaninoff (composer)", "Sergei Rachmaninoff", "Composer summary.")
                .with_page("Rachmaninoff (performer)", "Rachmaninoff discography", "Performer summary."),
        );

        let composer = cache.get_entity_data("Rachmaninoff", EntityKind::Composer).await.unwrap();
        let performer = cache.get_entity_data("Rachmaninoff", EntityKind::Performer).await.unwrap();

        assert_eq!(composer.summary, "Composer summary.");
        assert_eq!(performer.summary, "Performer summary.");
        assert_eq!(cache.len(), 2);
        assert!(source.query_count() >= 4);
    }

    #[tokio::test]
    async fn test_file_format_and_corruption_recovery() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let (cache, _) = cache_in(&dir, ScriptedSource::new().with_page("Satie", "Erik Satie", "French."));
        cache.get_entity_data("Satie", EntityKind::Composer).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["composer:Satie"]["name"], "Satie");
        assert_eq!(json["composer:Satie"]["summary"], "French.");
        assert!(json["composer:Satie"]["image_url"].is_null());

        std::fs::write(&path, "{ this is not json").unwrap();
        let (recovered, _) = cache_in(&dir, ScriptedSource::new());
        assert!(recovered.is_empty());
    }
}
