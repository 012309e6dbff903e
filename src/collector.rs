//! One collection cycle against one management controller.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ExporterConfig;
use crate::metrics::MetricSink;
use crate::redfish::{RedfishClient, RedfishTransport, Target};
use crate::smart::DriveMetricExtractor;
use crate::storage::{DriveWalker, LinkFilter};

pub const REDFISH_UP: &str = "redfish_up";
pub const RESPONSE_DURATION: &str = "redfish_response_duration_seconds";
pub const SCRAPE_DURATION: &str = "redfish_health_scrape_duration_seconds";

/// What a cycle achieved, for logging and the one-shot test mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSummary {
    pub reachable: bool,
    pub drives_visited: usize,
    pub duration_seconds: f64,
}

/// Connect, walk the storage tree and emit every drive's samples into `sink`.
/// Never fails: problems end up as `redfish_up 0` or skipped drives.
pub async fn collect(
    target: Target,
    config: &ExporterConfig,
    transport: Arc<dyn RedfishTransport>,
    sink: &mut dyn MetricSink,
) -> CycleSummary {
    let started = Instant::now();
    let extractor = DriveMetricExtractor::new(&target.address, &target.host, config.instance_port);
    let instance_labels = extractor.instance_labels();
    let mut client = RedfishClient::new(target, transport);

    let session = client.connect().await;
    sink.add_sample(REDFISH_UP, if session.reachable { 1.0 } else { 0.0 }, &instance_labels);
    sink.add_sample(RESPONSE_DURATION, session.latency_seconds, &instance_labels);

    let address = client.target().address.clone();
    let storage_services = client.session().storage_services_path().map(str::to_string);
    let mut drives_visited = 0;

    match (session.reachable, storage_services) {
        (false, _) => {
            warn!("Target {}: Server is not reachable, no health data collected", address);
            client.close().await;
            return CycleSummary {
                reachable: false,
                drives_visited,
                duration_seconds: elapsed_centis(started),
            };
        }
        (true, None) => warn!("Target {}: No SMART data provided! Cannot get SMART data!", address),
        (true, Some(path)) => {
            info!("Target {}: Collecting health data ...", address);
            let run_timestamp = chrono::Utc::now().timestamp();
            let mut walker = DriveWalker::new(path, LinkFilter::from_config(config));
            while let Some(drive) = walker.next_drive(&mut client).await {
                extractor.extract(&drive, sink, run_timestamp);
                drives_visited += 1;
            }
            debug!("Target {}: Completed SMART data collection, {} drives", address, drives_visited);
        }
    }

    let duration_seconds = elapsed_centis(started);
    sink.add_sample(SCRAPE_DURATION, duration_seconds, &instance_labels);
    info!("Target {}: Scrape duration: {} seconds", address, duration_seconds);

    client.close().await;

    CycleSummary {
        reachable: true,
        drives_visited,
        duration_seconds,
    }
}

fn elapsed_centis(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}
