//! Connection descriptor and the per-cycle Redfish client.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::ExporterConfig;
use crate::redfish::session::Session;
use crate::redfish::transport::RedfishTransport;

pub const REDFISH_ROOT: &str = "/redfish/v1";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One management controller to scrape. Immutable for the whole cycle.
#[derive(Debug, Clone)]
pub struct Target {
    /// Network address used for requests (IP or name)
    pub address: String,
    /// Human-readable host name used in labels and logs
    pub host: String,
    pub credentials: Credentials,
    pub port: u16,
    pub timeout: Duration,
}

impl Target {
    pub fn from_config(address: impl Into<String>, host: impl Into<String>, config: &ExporterConfig) -> Self {
        Self {
            address: address.into(),
            host: host.into(),
            credentials: Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            port: config.rf_port,
            timeout: Duration::from_secs(config.timeout),
        }
    }

    /// `https://<address>:<port>/`, with IPv6 literals bracketed.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let host = match self.address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]", ip),
            _ => self.address.clone(),
        };
        Url::parse(&format!("https://{}:{}/", host, self.port))
    }

    /// Resolve a resource path against this target. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url()?.join(path)
    }
}

/// Exclusive handle for one collection cycle: the target, its transport
/// and the session state. The session manager writes the auth fields,
/// everything else only reads them.
pub struct RedfishClient {
    pub(crate) target: Target,
    pub(crate) transport: Arc<dyn RedfishTransport>,
    pub(crate) session: Session,
}

impl RedfishClient {
    pub fn new(target: Target, transport: Arc<dyn RedfishTransport>) -> Self {
        Self {
            target,
            transport,
            session: Session::default(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
