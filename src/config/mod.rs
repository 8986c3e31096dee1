//! Configuration module for the MIDI library generator
//!
//! This module contains the build configuration and output path management.

mod build_config;
mod paths;

pub use build_config::{BuildConfig, MetadataSource, SyncPolicy};
pub use paths::OutputPaths;

/// Prefix of generated file ids
pub const FILE_ID_PREFIX: &str = "file-id-";
