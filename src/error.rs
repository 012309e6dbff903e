//! Exporter error type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Could not open logfile {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid target '{0}': {1}")]
    InvalidTarget(String, String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
