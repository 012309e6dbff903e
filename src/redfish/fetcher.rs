//! Single authenticated GET against a Redfish resource, normalized to
//! object / status code / empty.

use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::redfish::client::RedfishClient;
use crate::redfish::session::AuthMode;
use crate::redfish::transport::{RequestAuth, TransportError, TransportResponse};

/// Reported for connect and read timeouts.
pub const STATUS_TIMEOUT: u16 = 408;
/// Reported when the controller could not be reached at all.
pub const STATUS_UNREACHABLE: u16 = 444;

/// Which credentials to use for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOverride {
    /// Whatever the session currently holds
    Session,
    Unauthenticated,
    Basic,
}

/// Normalized result of a fetch. `Status` and `Empty` are both skippable.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Object(Map<String, Value>),
    Status(u16),
    Empty,
}

impl FetchOutcome {
    pub fn into_object(self) -> Option<Map<String, Value>> {
        match self {
            FetchOutcome::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            FetchOutcome::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl RedfishClient {
    pub async fn fetch(&mut self, path: &str, auth: AuthOverride) -> FetchOutcome {
        let url = match self.target.url(path) {
            Ok(url) => url,
            Err(e) => {
                error!("Target {}: Invalid resource path {}: {}", self.target.address, path, e);
                return FetchOutcome::Empty;
            }
        };
        let request_auth = self.request_auth(auth);

        info!("Target {}: Using URL {}", self.target.address, url);
        debug!("Target {}: Using {:?} auth", self.target.address, request_auth);

        let started = Instant::now();
        let outcome = match self.transport.get(url.as_str(), &request_auth).await {
            Ok(response) => self.interpret(response),
            Err(TransportError::ConnectTimeout) => {
                error!("Target {}: Timeout while connecting to {}", self.target.address, self.target.host);
                self.session.last_http_status = STATUS_TIMEOUT;
                FetchOutcome::Status(STATUS_TIMEOUT)
            }
            Err(TransportError::ReadTimeout) => {
                error!("Target {}: Timeout while reading data from {}", self.target.address, self.target.host);
                self.session.last_http_status = STATUS_TIMEOUT;
                FetchOutcome::Status(STATUS_TIMEOUT)
            }
            Err(TransportError::Connection(reason)) => {
                error!("Target {}: Unable to connect to {}: {}", self.target.address, self.target.host, reason);
                self.session.last_http_status = STATUS_UNREACHABLE;
                FetchOutcome::Status(STATUS_UNREACHABLE)
            }
        };

        debug!(
            "Target {}: Request duration: {:.2}",
            self.target.address,
            started.elapsed().as_secs_f64()
        );
        outcome
    }

    fn request_auth(&self, auth: AuthOverride) -> RequestAuth {
        let basic = || RequestAuth::Basic {
            username: self.target.credentials.username.clone(),
            password: self.target.credentials.password.clone(),
        };

        match auth {
            AuthOverride::Unauthenticated => RequestAuth::None,
            AuthOverride::Basic => basic(),
            AuthOverride::Session => match self.session.auth_mode() {
                AuthMode::Basic => basic(),
                AuthMode::Token => RequestAuth::Token(self.session.auth_token().to_string()),
                AuthMode::NoneYet => RequestAuth::None,
            },
        }
    }

    fn interpret(&mut self, response: TransportResponse) -> FetchOutcome {
        self.session.last_http_status = response.status;
        let body: Option<Value> = if response.body.is_empty() {
            None
        } else {
            serde_json::from_slice(&response.body).ok()
        };

        if response.is_success() {
            debug!("Target {}: Request successful, status: {}", self.target.address, response.status);
            return match body {
                Some(Value::Object(object)) => FetchOutcome::Object(object),
                _ => {
                    info!("Target {}: No json data received.", self.target.address);
                    FetchOutcome::Empty
                }
            };
        }

        if let Some(body) = &body {
            for line in error_envelope_messages(body) {
                info!("Target {}: {}", self.target.address, line);
            }
        }

        if response.status == 401 {
            error!(
                "Target {}: Authorization Error: Wrong user/password set on server {}",
                self.target.address, self.target.host
            );
            FetchOutcome::Empty
        } else {
            FetchOutcome::Status(response.status)
        }
    }
}

/// Diagnostic lines from a Redfish error envelope: `"<code>: <message>"`
/// followed by the first `@Message.ExtendedInfo` message, when present.
pub fn error_envelope_messages(body: &Value) -> Vec<String> {
    let Some(error) = body.get("error") else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let code = error.get("code").and_then(Value::as_str);
    let message = error.get("message").and_then(Value::as_str);
    if code.is_some() || message.is_some() {
        lines.push(format!("{}: {}", code.unwrap_or(""), message.unwrap_or("")));
    }

    let extended = match error.get("@Message.ExtendedInfo") {
        Some(Value::Array(entries)) => entries.first(),
        Some(entry @ Value::Object(_)) => Some(entry),
        _ => None,
    };
    if let Some(text) = extended.and_then(|e| e.get("Message")).and_then(Value::as_str) {
        lines.push(text.to_string());
    }

    lines
}
