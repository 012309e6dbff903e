//! Config file loading and environment overrides.

use std::path::Path;
use tracing::{info, warn};

use crate::config::types::ExporterConfig;
use crate::error::{ExporterError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yml";

/// Load the YAML config from `path` and apply `TIMEOUT` / `LISTEN_PORT`
/// environment overrides.
pub fn load_config(path: &Path) -> Result<ExporterConfig> {
    if !path.exists() {
        return Err(ExporterError::ConfigNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ExporterError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse_config(&content).map_err(|source| ExporterError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    if config.username.is_empty() {
        warn!("No Redfish username configured in {:?}. Authenticated requests will fail.", path);
    }

    info!("Loaded configuration from: {:?}", path);
    Ok(config)
}

/// An empty document yields the defaults.
pub fn parse_config(content: &str) -> std::result::Result<ExporterConfig, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(ExporterConfig::default());
    }
    serde_yaml::from_str(content)
}

pub(crate) fn apply_env_overrides<F>(config: &mut ExporterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("TIMEOUT") {
        match raw.trim().parse() {
            Ok(timeout) => config.timeout = timeout,
            Err(_) => warn!("Ignoring invalid TIMEOUT value '{}'", raw),
        }
    }

    if let Some(raw) = lookup("LISTEN_PORT") {
        match raw.trim().parse() {
            Ok(port) => config.listen_port = port,
            Err(_) => warn!("Ignoring invalid LISTEN_PORT value '{}'", raw),
        }
    }
}
