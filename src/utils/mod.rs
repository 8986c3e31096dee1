//! Utility modules

pub mod filesystem;
pub mod parsers;
pub mod slug;
