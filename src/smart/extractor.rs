//! Per-drive SMART metric emission.

use tracing::{debug, warn};

use crate::metrics::{Labels, MetricSink};
use crate::smart::rules::{parse_numeric, MediaRules};
use crate::smart::status::{report_unknown_word, DriveHealth};
use crate::storage::DriveRecord;

pub const DEVICE_ACTIVE: &str = "smartmon_device_active";
pub const SMART_AVAILABLE: &str = "smartmon_device_smart_available";
pub const SMART_ENABLED: &str = "smartmon_device_smart_enabled";
pub const SMART_HEALTHY: &str = "smartmon_device_smart_healthy";
pub const DEVICE_INFO: &str = "smartmon_device_info";
pub const SMARTCTL_RUN: &str = "smartmon_smartctl_run";

/// Turns drive records of one target into samples.
#[derive(Debug, Clone)]
pub struct DriveMetricExtractor {
    address: String,
    host: String,
    instance: String,
}

impl DriveMetricExtractor {
    pub fn new(address: impl Into<String>, host: impl Into<String>, instance_port: u16) -> Self {
        let address = address.into();
        let instance = format!("{}:{}", address, instance_port);
        Self {
            address,
            host: host.into(),
            instance,
        }
    }

    /// `host` and `redfish_instance`, carried by every sample of the target.
    pub fn instance_labels(&self) -> Labels {
        let mut labels = Labels::new();
        labels.insert("host".to_string(), self.host.clone());
        labels.insert("redfish_instance".to_string(), self.instance.clone());
        labels
    }

    fn drive_labels(&self, disk: String, drive: &DriveRecord) -> Labels {
        let mut labels = self.instance_labels();
        labels.insert("disk".to_string(), disk);
        labels.insert("type".to_string(), drive.media_type.label().to_string());
        labels
    }

    /// Emit all samples for one drive. `run_timestamp` is the cycle's Unix
    /// time, so repeated calls on the same record emit identical samples.
    pub fn extract(&self, drive: &DriveRecord, sink: &mut dyn MetricSink, run_timestamp: i64) {
        let Some(rules) = MediaRules::for_media(&drive.media_type) else {
            debug!("Target {}: Unsupported media type: {}", self.address, drive.media_type.label());
            return;
        };

        let Some(attributes) = &drive.smart_attributes else {
            debug!("Target {}: No SMART data for drive {}", self.address, drive.path);
            let labels = self.drive_labels(String::new(), drive);
            for name in [DEVICE_ACTIVE, SMART_AVAILABLE, SMART_ENABLED] {
                sink.add_sample(name, 0.0, &labels);
            }
            return;
        };

        let labels = self.drive_labels(drive.device_path(), drive);
        for name in [DEVICE_ACTIVE, SMART_AVAILABLE, SMART_ENABLED] {
            sink.add_sample(name, 1.0, &labels);
        }

        let health = self.drive_health(drive);
        sink.add_sample(SMART_HEALTHY, health, &labels);
        sink.add_sample(DEVICE_INFO, health, &self.info_labels(drive));

        let classified = rules.classify_all(attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        for attribute in rules.emitted {
            let (Some(raw), Some(name)) = (classified.get(attribute), attribute.metric_name()) else {
                continue;
            };
            match parse_numeric(raw) {
                Some(value) => sink.add_sample(name, value, &labels),
                None => debug!("Target {}: Skipping non-numeric {:?} value '{}'", self.address, attribute, raw),
            }
        }

        sink.add_sample(SMARTCTL_RUN, run_timestamp as f64, &labels);
    }

    fn drive_health(&self, drive: &DriveRecord) -> f64 {
        let health = DriveHealth::from_state(drive.status_state.as_deref());
        match &health {
            DriveHealth::Scored(_) => {}
            DriveHealth::Absent | DriveHealth::Missing => warn!(
                "Target {}: Host {}, Model {}: No health data found.",
                self.address,
                self.host,
                model_or_unknown(drive)
            ),
            DriveHealth::Unrecognized(word) => {
                report_unknown_word(word);
            }
        }
        health.value()
    }

    fn info_labels(&self, drive: &DriveRecord) -> Labels {
        let serial = drive.serial_number.clone().unwrap_or_else(|| drive.id.clone());
        let mut labels = self.drive_labels(drive.device_path(), drive);
        labels.insert("serial_number".to_string(), serial);
        labels.insert("model_family".to_string(), drive.model.to_lowercase());
        labels
    }
}

fn model_or_unknown(drive: &DriveRecord) -> &str {
    if drive.model.is_empty() {
        "Unknown"
    } else {
        &drive.model
    }
}
