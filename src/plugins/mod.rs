//! External knowledge sources used to enrich catalog entities

pub mod wikipedia;

pub use wikipedia::{KnowledgeSource, PageLookup, PageSummary, WikipediaClient};
