//! Exporter configuration: YAML types and loading.

pub mod persistence;
pub mod types;

pub use persistence::{load_config, DEFAULT_CONFIG_PATH};
pub use types::{ExporterConfig, LinkFilterMode};
