//! Composer and performer entities

use serde::{Deserialize, Serialize};

use super::EntityKind;

/// Externally sourced description of an entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Summary text (a not-found message when nothing resolved)
    pub summary: String,
    /// Representative image URL
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A composer or performer, keyed by slug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Composer or performer
    pub kind: EntityKind,
    /// Identity
    pub slug: String,
    /// Display name (registry-substituted for performers)
    pub name: String,
    /// Page URL for the renderer
    pub page_url: String,
    /// Enrichment data
    #[serde(flatten)]
    pub enrichment: Enrichment,
    /// File ids in discovery order
    #[serde(default)]
    pub works: Vec<String>,
}

impl Entity {
    /// Create a new entity with no works yet
    pub fn new(kind: EntityKind, slug: String, name: String, enrichment: Enrichment) -> Self {
        let page_url = format!("/{}/{}.html", kind.dir_name(), slug);
        Self {
            kind,
            slug,
            name,
            page_url,
            enrichment,
            works: Vec::new(),
        }
    }

    /// Key of this entity's playlist
    pub fn playlist_key(&self) -> String {
        format!("{}-{}", self.kind, self.slug)
    }
}
