//! HTTP transport seam for talking to a management controller.
//! `ReqwestTransport` is the production implementation; tests plug in scripted doubles.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use thiserror::Error;
use tracing::trace;

use crate::error::Result;

pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Credentials attached to a single request.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestAuth {
    None,
    Basic { username: String, password: String },
    Token(String),
}

impl std::fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestAuth::None => write!(f, "None"),
            RequestAuth::Basic { username, .. } => write!(f, "Basic({})", username),
            RequestAuth::Token(_) => write!(f, "Token(***)"),
        }
    }
}

/// Raw response as seen by the transport. Header names are lower-case.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout while connecting")]
    ConnectTimeout,

    #[error("timeout while reading data")]
    ReadTimeout,

    #[error("connection failed: {0}")]
    Connection(String),
}

impl TransportError {
    /// Connect timeouts are connection failures too.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, TransportError::ConnectTimeout | TransportError::Connection(_))
    }
}

#[async_trait]
pub trait RedfishTransport: Send + Sync {
    /// Issue a GET with the given credentials.
    async fn get(&self, url: &str, auth: &RequestAuth) -> std::result::Result<TransportResponse, TransportError>;

    /// POST a JSON document without credentials (session creation).
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError>;

    /// Issue a DELETE with the given credentials.
    async fn delete(&self, url: &str, auth: &RequestAuth) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport. Certificate verification is disabled because
/// management controllers ship self-signed certificates.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("charset", HeaderValue::from_static("utf-8"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .default_headers(headers)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    fn authorize(builder: reqwest::RequestBuilder, auth: &RequestAuth) -> reqwest::RequestBuilder {
        match auth {
            RequestAuth::None => builder,
            RequestAuth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            RequestAuth::Token(token) => builder.header(AUTH_TOKEN_HEADER, token),
        }
    }

    async fn send(builder: reqwest::RequestBuilder) -> std::result::Result<TransportResponse, TransportError> {
        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(classify_error)?.to_vec();

        Ok(TransportResponse { status, headers, body })
    }
}

#[async_trait]
impl RedfishTransport for ReqwestTransport {
    async fn get(&self, url: &str, auth: &RequestAuth) -> std::result::Result<TransportResponse, TransportError> {
        trace!("GET {} ({:?})", url, auth);
        Self::send(Self::authorize(self.client.get(url), auth)).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError> {
        trace!("POST {}", url);
        Self::send(self.client.post(url).json(body)).await
    }

    async fn delete(&self, url: &str, auth: &RequestAuth) -> std::result::Result<TransportResponse, TransportError> {
        trace!("DELETE {} ({:?})", url, auth);
        Self::send(Self::authorize(self.client.delete(url), auth)).await
    }
}

fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        if err.is_connect() {
            TransportError::ConnectTimeout
        } else {
            TransportError::ReadTimeout
        }
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut response = TransportResponse { status: 201, ..Default::default() };
        response.headers.insert("x-auth-token".to_string(), "abc".to_string());
        assert_eq!(response.header(AUTH_TOKEN_HEADER), Some("abc"));
        assert!(response.is_success());
    }

    #[test]
    fn connect_timeout_counts_as_connection_failure() {
        assert!(TransportError::ConnectTimeout.is_connection_failure());
        assert!(TransportError::Connection("refused".into()).is_connection_failure());
        assert!(!TransportError::ReadTimeout.is_connection_failure());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let basic = RequestAuth::Basic { username: "root".into(), password: "hunter2".into() };
        let token = RequestAuth::Token("deadbeef".into());
        assert_eq!(format!("{:?}", basic), "Basic(root)");
        assert!(!format!("{:?}", token).contains("deadbeef"));
    }
}
