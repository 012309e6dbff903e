//! SMART attribute classification, health scoring and metric extraction.

pub mod extractor;
pub mod rules;
pub mod status;

pub use extractor::DriveMetricExtractor;
pub use rules::{parse_numeric, Attribute, MediaRules, Rule, NVME_RULES, SCSI_RULES};
pub use status::{DriveHealth, HealthWord};
