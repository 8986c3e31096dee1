//! Enums for the catalog model

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Composer,
    Performer,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Composer => "composer",
            EntityKind::Performer => "performer",
        }
    }

    /// Name used when extraction could not find one
    pub fn unknown_name(&self) -> &'static str {
        match self {
            EntityKind::Composer => "Unknown Composer",
            EntityKind::Performer => "Unknown Performer",
        }
    }

    /// Output directory holding this kind's pages
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityKind::Composer => "composers",
            EntityKind::Performer => "performers",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_strings() {
        assert_eq!(EntityKind::Composer.to_string(), "composer");
        assert_eq!(EntityKind::Performer.dir_name(), "performers");
        assert_eq!(
            serde_json::to_string(&EntityKind::Performer).unwrap(),
            "\"performer\""
        );
    }
}
