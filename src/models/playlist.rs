//! Playlist model

use serde::{Deserialize, Serialize};

/// One playable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub url: String,
    pub title: String,
}

/// Ordered items for one composer or performer
pub type Playlist = Vec<PlaylistItem>;
