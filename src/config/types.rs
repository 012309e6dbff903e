//! Exporter configuration structs and defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_rf_port")]
    pub rf_port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Port rendered into the `redfish_instance` label
    #[serde(default = "default_instance_port")]
    pub instance_port: u16,
    #[serde(default)]
    pub link_filter: LinkFilterMode,
    #[serde(default = "default_link_key_prefixes")]
    pub link_key_prefixes: Vec<String>,
}

/// Which link-naming convention the managed BMCs follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkFilterMode {
    #[default]
    Path,
    KeyPrefix,
}

pub fn default_rf_port() -> u16 { 443 }
pub fn default_timeout() -> u64 { 10 }
pub fn default_listen_port() -> u16 { 9200 }
pub fn default_instance_port() -> u16 { 9220 }

pub fn default_link_key_prefixes() -> Vec<String> {
    vec!["enclosure_id".to_string(), "Bay".to_string()]
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            rf_port: default_rf_port(),
            timeout: default_timeout(),
            listen_port: default_listen_port(),
            instance_port: default_instance_port(),
            link_filter: LinkFilterMode::default(),
            link_key_prefixes: default_link_key_prefixes(),
        }
    }
}
