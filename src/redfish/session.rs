//! Session establishment: token auth with fallback to basic auth,
//! liveness and service root latency, and session release.

use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::redfish::client::{RedfishClient, REDFISH_ROOT};
use crate::redfish::fetcher::AuthOverride;
use crate::redfish::transport::{RequestAuth, TransportResponse, AUTH_TOKEN_HEADER};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    NoneYet,
    Token,
    Basic,
}

/// Mutable per-cycle session state.
///
/// Token mode always carries a non-empty token. Once downgraded to basic
/// auth the session never returns to token mode within the cycle.
#[derive(Debug, Clone, Default)]
pub struct Session {
    auth_mode: AuthMode,
    auth_token: String,
    session_path: String,
    storage_services_path: Option<String>,
    pub(crate) reachable: bool,
    pub(crate) last_latency_seconds: f64,
    pub(crate) last_http_status: u16,
}

impl Session {
    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn session_path(&self) -> &str {
        &self.session_path
    }

    pub fn storage_services_path(&self) -> Option<&str> {
        self.storage_services_path.as_deref()
    }

    pub fn reachable(&self) -> bool {
        self.reachable
    }

    pub fn last_latency_seconds(&self) -> f64 {
        self.last_latency_seconds
    }

    pub fn last_http_status(&self) -> u16 {
        self.last_http_status
    }

    /// Switch to token auth. Refused (returns false) for an empty token or
    /// after a downgrade to basic auth.
    pub fn use_token(&mut self, token: String, session_path: String) -> bool {
        if token.is_empty() || self.auth_mode == AuthMode::Basic {
            return false;
        }
        self.auth_mode = AuthMode::Token;
        self.auth_token = token;
        self.session_path = session_path;
        true
    }

    pub fn downgrade_to_basic(&mut self) {
        self.auth_mode = AuthMode::Basic;
        self.auth_token.clear();
        self.session_path.clear();
    }

    fn release_token(&mut self) {
        if self.auth_mode == AuthMode::Token {
            self.auth_mode = AuthMode::NoneYet;
        }
        self.auth_token.clear();
        self.session_path.clear();
    }
}

/// Outcome of `connect`, as reported to the exposition layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionResult {
    pub reachable: bool,
    pub latency_seconds: f64,
    pub http_status: u16,
}

impl RedfishClient {
    /// Check the service root and establish the session. Never fails: every
    /// error path ends in basic-auth mode or an unreachable session.
    pub async fn connect(&mut self) -> SessionResult {
        info!("Target {}: Connecting to server {}", self.target.address, self.target.host);

        let started = Instant::now();
        let service_root = self.fetch(REDFISH_ROOT, AuthOverride::Unauthenticated).await;
        self.session.last_latency_seconds = round_centis(started.elapsed().as_secs_f64());
        info!(
            "Target {}: Response time: {} seconds.",
            self.target.address, self.session.last_latency_seconds
        );

        let Some(root) = service_root.into_object() else {
            warn!("Target {}: No data received from server {}!", self.target.address, self.target.host);
            return self.session_result();
        };

        let mut session_service = String::new();
        for key in ["SessionService", "StorageServices"] {
            match odata_link(&root, key) {
                Some(link) => {
                    debug!("Target {}: Found {} URL: {}", self.target.address, key, link);
                    if key == "SessionService" {
                        session_service = link;
                    } else {
                        self.session.storage_services_path = Some(link);
                    }
                }
                None => {
                    warn!("Target {}: No {} URL found on server {}!", self.target.address, key, self.target.host);
                    return self.session_result();
                }
            }
        }
        self.session.reachable = true;

        let authenticated = self.fetch(REDFISH_ROOT, AuthOverride::Basic).await;
        debug!(
            "Target {}: Session service response status: {}",
            self.target.address, self.session.last_http_status
        );
        if self.session.last_http_status != 200 {
            warn!("Target {}: Failed to get a session from server {}!", self.target.address, self.target.host);
            self.session.downgrade_to_basic();
            return self.session_result();
        }

        if let Some(link) = authenticated.as_object().and_then(|r| odata_link(r, "SessionService")) {
            session_service = link;
        }
        self.create_token_session(&session_service).await;

        self.session_result()
    }

    async fn create_token_session(&mut self, session_service: &str) {
        let url = match self.target.url(&format!("{}/Sessions", session_service.trim_end_matches('/'))) {
            Ok(url) => url,
            Err(e) => {
                warn!("Target {}: Invalid session service URL {}: {}", self.target.address, session_service, e);
                self.session.downgrade_to_basic();
                return;
            }
        };
        let body = json!({
            "UserName": self.target.credentials.username,
            "Password": self.target.credentials.password,
        });
        debug!("Target {}: Attempting session creation at: {}", self.target.address, url);

        let mut attempt = self.transport.post_json(url.as_str(), &body).await;
        if matches!(&attempt, Err(e) if e.is_connection_failure()) {
            warn!(
                "Target {}: Failed to get an auth token from server {}. Retrying ...",
                self.target.address, self.target.host
            );
            attempt = self.transport.post_json(url.as_str(), &body).await;
        }

        let response = match attempt {
            Ok(response) => response,
            Err(e) if e.is_connection_failure() => {
                error!(
                    "Target {}: Error getting an auth token from server {}: {}",
                    self.target.address, self.target.host, e
                );
                self.session.downgrade_to_basic();
                return;
            }
            Err(e) => {
                warn!("Target {}: No session received from server {}: {}", self.target.address, self.target.host, e);
                warn!("Target {}: Switching to basic authentication.", self.target.address);
                self.session.downgrade_to_basic();
                return;
            }
        };

        if !matches!(response.status, 200 | 201) {
            warn!(
                "Target {}: No session received from server {}: HTTP {}",
                self.target.address, self.target.host, response.status
            );
            warn!("Target {}: Switching to basic authentication.", self.target.address);
            self.session.downgrade_to_basic();
            return;
        }

        let token = response.header(AUTH_TOKEN_HEADER).unwrap_or_default().to_string();
        let session_path = session_resource_path(&response, &url).unwrap_or_default();
        if self.session.use_token(token, session_path) {
            info!("Target {}: Got an auth token from server {}!", self.target.address, self.target.host);
            debug!("Target {}: Session URL: {}", self.target.address, self.session.session_path);
        } else {
            warn!(
                "Target {}: Session response from {} carried no auth token. Switching to basic authentication.",
                self.target.address, self.target.host
            );
            self.session.downgrade_to_basic();
        }
    }

    /// Release the session. Deleting the session resource is best effort.
    pub async fn close(&mut self) {
        debug!("Target {}: Deleting Redfish session with server {}", self.target.address, self.target.host);

        if self.session.auth_mode == AuthMode::Token && !self.session.session_path.is_empty() {
            let auth = RequestAuth::Token(self.session.auth_token.clone());
            match self.target.url(&self.session.session_path) {
                Ok(url) => {
                    debug!("Target {}: Deleting session at URL: {}", self.target.address, url);
                    match self.transport.delete(url.as_str(), &auth).await {
                        Ok(response) if response.is_success() => {
                            debug!("Target {}: Session deleted", self.target.address)
                        }
                        Ok(response) => debug!(
                            "Target {}: Session delete returned HTTP {}",
                            self.target.address, response.status
                        ),
                        Err(e) => debug!("Target {}: Session delete failed: {}", self.target.address, e),
                    }
                }
                Err(e) => debug!(
                    "Target {}: Invalid session URL {}: {}",
                    self.target.address, self.session.session_path, e
                ),
            }
        } else {
            debug!(
                "Target {}: No Redfish session existing with server {}",
                self.target.address, self.target.host
            );
        }

        self.session.release_token();
    }

    fn session_result(&self) -> SessionResult {
        SessionResult {
            reachable: self.session.reachable,
            latency_seconds: self.session.last_latency_seconds,
            http_status: self.session.last_http_status,
        }
    }
}

/// `object[key]["@odata.id"]` as an owned string.
pub(crate) fn odata_link(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(|v| v.get("@odata.id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Session resource path from the body's `@odata.id`, else the `Location`
/// header. Either may be relative to the sessions collection it was posted to.
fn session_resource_path(response: &TransportResponse, post_url: &Url) -> Option<String> {
    let from_body = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("@odata.id").and_then(Value::as_str).map(str::to_string));

    let reference = from_body.or_else(|| response.header("location").map(str::to_string))?;
    post_url.join(&reference).ok().map(|url| url.path().to_string())
}

fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_requires_non_empty_value() {
        let mut session = Session::default();
        assert!(!session.use_token(String::new(), "/s/1".into()));
        assert_eq!(session.auth_mode(), AuthMode::NoneYet);
        assert!(session.use_token("abc".into(), "/s/1".into()));
        assert_eq!(session.auth_mode(), AuthMode::Token);
    }

    #[test]
    fn basic_downgrade_is_permanent() {
        let mut session = Session::default();
        session.downgrade_to_basic();
        assert!(!session.use_token("abc".into(), "/s/1".into()));
        assert_eq!(session.auth_mode(), AuthMode::Basic);
        assert!(session.auth_token().is_empty());
    }

    fn sessions_url() -> Url {
        Url::parse("https://10.0.0.1/redfish/v1/SessionService/Sessions").unwrap()
    }

    fn created_at(location: &str) -> TransportResponse {
        let mut response = TransportResponse {
            status: 201,
            ..Default::default()
        };
        response.headers.insert("location".into(), location.into());
        response
    }

    #[test]
    fn location_header_is_reduced_to_a_path() {
        for location in [
            "https://10.0.0.1/redfish/v1/SessionService/Sessions/7",
            "/redfish/v1/SessionService/Sessions/7",
            "Sessions/7",
        ] {
            assert_eq!(
                session_resource_path(&created_at(location), &sessions_url()).as_deref(),
                Some("/redfish/v1/SessionService/Sessions/7"),
                "location {}",
                location
            );
        }
    }

    #[test]
    fn session_path_prefers_body_over_location() {
        let mut response = created_at("/redfish/v1/SessionService/Sessions/2");
        response.body = br#"{"@odata.id": "/redfish/v1/SessionService/Sessions/1"}"#.to_vec();
        assert_eq!(
            session_resource_path(&response, &sessions_url()).as_deref(),
            Some("/redfish/v1/SessionService/Sessions/1")
        );

        response.body.clear();
        assert_eq!(
            session_resource_path(&response, &sessions_url()).as_deref(),
            Some("/redfish/v1/SessionService/Sessions/2")
        );
    }

    #[test]
    fn missing_session_reference_yields_no_path() {
        let response = TransportResponse {
            status: 201,
            ..Default::default()
        };
        assert_eq!(session_resource_path(&response, &sessions_url()), None);
    }

    #[test]
    fn latency_is_rounded_to_hundredths() {
        assert_eq!(round_centis(0.12789), 0.13);
    }
}
