//! HTTP exposition: welcome page and the per-target `/health` scrape endpoint.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::collector::{collect, CycleSummary};
use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};
use crate::metrics::{MetricSink, PrometheusSink};
use crate::redfish::{ReqwestTransport, Target};

const WELCOME_PAGE: &str = "<h1>Redfish Exporter</h1>\n<h2>Prometheus Exporter for redfish API based servers monitoring</h2>\n<ul>\n    <li>Use <a href=\"/health\">/health</a> to retrieve health metrics.</li>\n</ul>\n";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ExporterConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    target: Option<String>,
}

impl IntoResponse for ExporterError {
    fn into_response(self) -> Response {
        let status = match self {
            ExporterError::InvalidTarget(..) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(scrape_health))
        .with_state(state)
}

/// Bind `0.0.0.0:<listen_port>` and serve until Ctrl-C.
pub async fn serve(config: ExporterConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting Redfish Prometheus Server on Port {}", config.listen_port);

    let app = build_router(AppState { config: Arc::new(config) });
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Stopping Redfish Prometheus Server");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn welcome() -> Html<&'static str> {
    Html(WELCOME_PAGE)
}

async fn scrape_health(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> std::result::Result<Response, ExporterError> {
    let Some(target) = params.target.filter(|t| !t.trim().is_empty()) else {
        error!("No target parameter provided!");
        return Ok((StatusCode::BAD_REQUEST, "Missing parameter: target").into_response());
    };
    debug!("Received Target {} for metrics type: health", target);

    let mut sink = PrometheusSink::new();
    collect_target(&state.config, target.trim(), &mut sink).await?;
    let body = sink.encode()?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}

/// Resolve `raw_target` and run one collection cycle into `sink`.
pub async fn collect_target(
    config: &ExporterConfig,
    raw_target: &str,
    sink: &mut dyn MetricSink,
) -> Result<CycleSummary> {
    let (address, host) = resolve_target(raw_target).await?;
    debug!(
        "Target {}: Using user {} with port {}",
        address, config.username, config.rf_port
    );

    let target = Target::from_config(address.to_string(), host, config);
    let transport = ReqwestTransport::new(Duration::from_secs(config.timeout))?;
    Ok(collect(target, config, Arc::new(transport), sink).await)
}

/// Address to connect to and host name for labels. An IP is used for both;
/// a host name is resolved forward, preferring IPv4.
pub async fn resolve_target(raw: &str) -> Result<(IpAddr, String)> {
    if let Ok(ip) = raw.parse::<IpAddr>() {
        debug!("Target {}: Target is an IP Address.", raw);
        return Ok((ip, raw.to_string()));
    }

    debug!("Target {}: Target is a hostname.", raw);
    let addresses: Vec<IpAddr> = tokio::net::lookup_host((raw, 0))
        .await
        .map_err(|e| {
            warn!("Target {}: DNS lookup failed: {}", raw, e);
            ExporterError::InvalidTarget(raw.to_string(), format!("DNS lookup failed: {}", e))
        })?
        .map(|addr| addr.ip())
        .collect();

    addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .map(|ip| (*ip, raw.to_string()))
        .ok_or_else(|| ExporterError::InvalidTarget(raw.to_string(), "no address found".to_string()))
}
