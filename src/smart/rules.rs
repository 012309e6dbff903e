//! Ordered classification rules mapping vendor SMART keys onto a fixed
//! attribute set, one table per media type.

use std::collections::HashMap;

use crate::storage::MediaType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Temperature,
    PowerCycles,
    PowerOnHours,
    PercentageUsed,
    MediaErrors,
    UnsafeShutdowns,
    ErrorInformationLogEntries,
    HostReadCommands,
    HostWriteCommands,
    ControllerBusyTime,
    AvailableSpare,
    AvailableSpareThreshold,
    FirmwareVersion,
    GrownDefects,
}

impl Attribute {
    /// Exported sample name. `None` for attributes that are classified but not exported.
    pub fn metric_name(self) -> Option<&'static str> {
        Some(match self {
            Attribute::Temperature => "smartmon_temperature_celsius_raw_value",
            Attribute::PowerCycles => "smartmon_power_cycle_count_raw_value",
            Attribute::PowerOnHours => "smartmon_power_on_hours_raw_value",
            Attribute::PercentageUsed => "smartmon_percentage_used_raw_value",
            Attribute::MediaErrors => "smartmon_media_and_data_integrity_errors_count_raw_value",
            Attribute::UnsafeShutdowns => "smartmon_unsafe_shutdowns_count_raw_value",
            Attribute::ErrorInformationLogEntries => "smartmon_error_information_log_entries_raw_value",
            Attribute::HostReadCommands => "smartmon_host_read_commands_raw_value",
            Attribute::HostWriteCommands => "smartmon_host_write_commands_raw_value",
            Attribute::ControllerBusyTime => "smartmon_controller_busy_time_raw_value",
            Attribute::AvailableSpare => "smartmon_available_spare_raw_value",
            Attribute::AvailableSpareThreshold => "smartmon_available_spare_threshold_raw_value",
            Attribute::GrownDefects => "smartmon_grown_defects_count_raw_value",
            Attribute::FirmwareVersion => return None,
        })
    }
}

/// Matches a key containing any of `any_of` and none of `none_of`.
/// Fragments are case-sensitive.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub attribute: Attribute,
    pub any_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
}

impl Rule {
    const fn new(attribute: Attribute, any_of: &'static [&'static str]) -> Self {
        Self { attribute, any_of, none_of: &[] }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.any_of.iter().any(|f| key.contains(f)) && !self.none_of.iter().any(|f| key.contains(f))
    }
}

/// Rule table and emission order for one media type.
#[derive(Debug)]
pub struct MediaRules {
    pub rules: &'static [Rule],
    pub emitted: &'static [Attribute],
}

pub static NVME_RULES: MediaRules = MediaRules {
    rules: &[
        Rule { attribute: Attribute::AvailableSpare, any_of: &["spare"], none_of: &["threshold"] },
        Rule::new(Attribute::AvailableSpareThreshold, &["spare"]),
        Rule::new(Attribute::ControllerBusyTime, &["controller"]),
        Rule::new(Attribute::ErrorInformationLogEntries, &["information"]),
        Rule::new(Attribute::FirmwareVersion, &["firmware"]),
        Rule::new(Attribute::HostWriteCommands, &["write"]),
        Rule::new(Attribute::HostReadCommands, &["read"]),
        Rule::new(Attribute::PowerOnHours, &["hours"]),
        Rule::new(Attribute::UnsafeShutdowns, &["shutdowns"]),
        Rule::new(Attribute::Temperature, &["temperature", "Temperature"]),
        Rule::new(Attribute::PowerCycles, &["cycle", "Cycle"]),
        Rule::new(Attribute::PercentageUsed, &["percentage", "Percentage"]),
        Rule::new(Attribute::MediaErrors, &["media", "Media"]),
    ],
    emitted: &[
        Attribute::Temperature,
        Attribute::PowerCycles,
        Attribute::PowerOnHours,
        Attribute::PercentageUsed,
        Attribute::MediaErrors,
        Attribute::UnsafeShutdowns,
        Attribute::ErrorInformationLogEntries,
        Attribute::HostReadCommands,
        Attribute::HostWriteCommands,
        Attribute::ControllerBusyTime,
        Attribute::AvailableSpare,
        Attribute::AvailableSpareThreshold,
    ],
};

pub static SCSI_RULES: MediaRules = MediaRules {
    rules: &[
        Rule::new(Attribute::GrownDefects, &["defects"]),
        Rule::new(Attribute::PowerOnHours, &["hours"]),
        Rule::new(Attribute::Temperature, &["temperature", "Temperature"]),
        Rule::new(Attribute::PowerCycles, &["cycle", "Cycle"]),
        Rule::new(Attribute::PercentageUsed, &["percentage", "Percentage"]),
    ],
    emitted: &[
        Attribute::Temperature,
        Attribute::PowerCycles,
        Attribute::PowerOnHours,
        Attribute::PercentageUsed,
        Attribute::GrownDefects,
    ],
};

impl MediaRules {
    pub fn for_media(media_type: &MediaType) -> Option<&'static MediaRules> {
        match media_type {
            MediaType::Nvme => Some(&NVME_RULES),
            MediaType::Sas => Some(&SCSI_RULES),
            MediaType::Other(_) => None,
        }
    }

    /// First matching rule wins.
    pub fn classify(&self, key: &str) -> Option<Attribute> {
        self.rules.iter().find(|rule| rule.matches(key)).map(|rule| rule.attribute)
    }

    /// Lower-cased raw value per attribute. When several keys land on the
    /// same attribute the last one wins.
    pub fn classify_all<'a>(
        &self,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> HashMap<Attribute, String> {
        let mut classified = HashMap::new();
        for (key, value) in attributes {
            if let Some(attribute) = self.classify(key) {
                classified.insert(attribute, value.to_lowercase());
            }
        }
        classified
    }
}

/// Parse a raw SMART value, tolerating a trailing unit such as `%` or ` C`.
/// Returns `None` for anything that is not a plain non-negative number.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let number = raw.trim().trim_end_matches(|c: char| !c.is_ascii_digit());
    if number.is_empty() || number.starts_with('.') || number.matches('.').count() > 1 {
        return None;
    }
    if !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    number.parse().ok()
}
