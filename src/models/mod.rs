//! Data models for the MIDI library
//!
//! This module contains the catalog built by one run: entities, files and
//! the playlists derived from them.

mod entity;
mod enums;
mod file;
mod playlist;

pub use entity::{Enrichment, Entity};
pub use enums::EntityKind;
pub use file::{file_id, CatalogFile, FileMetadata};
pub use playlist::{Playlist, PlaylistItem};

use serde::Serialize;
use std::collections::BTreeMap;

/// The complete data model handed to the renderer
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    /// Composers by slug
    pub composers: BTreeMap<String, Entity>,
    /// Performers by slug
    pub performers: BTreeMap<String, Entity>,
    /// Files by id
    pub files: BTreeMap<String, CatalogFile>,
    /// Playlists by `<kind>-<slug>`
    pub playlists: BTreeMap<String, Playlist>,
}

impl Catalog {
    /// Entity table for a kind
    pub fn entities(&self, kind: EntityKind) -> &BTreeMap<String, Entity> {
        match kind {
            EntityKind::Composer => &self.composers,
            EntityKind::Performer => &self.performers,
        }
    }

    pub fn entities_mut(&mut self, kind: EntityKind) -> &mut BTreeMap<String, Entity> {
        match kind {
            EntityKind::Composer => &mut self.composers,
            EntityKind::Performer => &mut self.performers,
        }
    }

    /// Recompute every playlist from the entities' works
    pub fn rebuild_playlists(&mut self) {
        let mut playlists = BTreeMap::new();

        for entity in self.composers.values().chain(self.performers.values()) {
            let items = entity
                .works
                .iter()
                .filter_map(|id| self.files.get(id))
                .map(|file| PlaylistItem {
                    url: file.media_url.clone(),
                    title: file.title.clone(),
                })
                .collect();
            playlists.insert(entity.playlist_key(), items);
        }

        self.playlists = playlists;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(id: &str, title: &str) -> CatalogFile {
        CatalogFile {
            id: id.to_string(),
            title: title.to_string(),
            composer_slug: "bach".to_string(),
            performer_slug: "busoni".to_string(),
            page_url: format!("/files/{}.html", id),
            media_url: format!("/midi-files/{}.mid", id),
            source_path: PathBuf::new(),
            output_path: PathBuf::new(),
        }
    }

    #[test]
    fn test_rebuild_playlists_mirrors_works() {
        let mut catalog = Catalog::default();
        catalog.files.insert("file-id-000000".into(), file("file-id-000000", "Chaconne"));
        catalog.files.insert("file-id-000001".into(), file("file-id-000001", "Toccata"));

        let mut bach = Entity::new(
            EntityKind::Composer,
            "bach".into(),
            "Bach".into(),
            Enrichment::default(),
        );
        bach.works = vec!["file-id-000001".into(), "file-id-000000".into()];
        catalog.composers.insert("bach".into(), bach);

        catalog.rebuild_playlists();
        let playlist = &catalog.playlists["composer-bach"];
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist[0].title, "Toccata");
        assert_eq!(playlist[1].url, "/midi-files/file-id-000000.mid");

        // a second rebuild replaces rather than appends
        catalog.rebuild_playlists();
        assert_eq!(catalog.playlists["composer-bach"].len(), 2);
    }
}
