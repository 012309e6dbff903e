//! Redfish SMART exporter: reads drive health from management controllers
//! over Redfish and republishes it as Prometheus gauges.

pub mod app;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod redfish;
pub mod server;
pub mod smart;
pub mod storage;

pub use collector::{collect, CycleSummary};
pub use config::ExporterConfig;
pub use error::{ExporterError, Result};
