//! Health keyword lexicon and drive health scoring.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use tracing::warn;

/// Vendor health words with a defined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthWord {
    Ok,
    Enabled,
    Critical,
    Error,
    Warning,
    Absent,
    Unknown,
    NotAvailable,
    NonCritical,
    NotInstalled,
    Unrecoverable,
    Unsupported,
}

impl HealthWord {
    pub const ALL: [HealthWord; 12] = [
        HealthWord::Ok,
        HealthWord::Enabled,
        HealthWord::Critical,
        HealthWord::Error,
        HealthWord::Warning,
        HealthWord::Absent,
        HealthWord::Unknown,
        HealthWord::NotAvailable,
        HealthWord::NonCritical,
        HealthWord::NotInstalled,
        HealthWord::Unrecoverable,
        HealthWord::Unsupported,
    ];

    /// Case-insensitive lookup. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let word = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|w| w.as_str() == word)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthWord::Ok => "ok",
            HealthWord::Enabled => "enabled",
            HealthWord::Critical => "critical",
            HealthWord::Error => "error",
            HealthWord::Warning => "warning",
            HealthWord::Absent => "absent",
            HealthWord::Unknown => "unknown",
            HealthWord::NotAvailable => "not available",
            HealthWord::NonCritical => "non-critical",
            HealthWord::NotInstalled => "not installed",
            HealthWord::Unrecoverable => "unrecoverable",
            HealthWord::Unsupported => "unsupported",
        }
    }

    pub fn score(self) -> f64 {
        match self {
            HealthWord::Ok => 1.0,
            _ => 0.0,
        }
    }
}

/// Health of one drive, derived from its `Status.State`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveHealth {
    Scored(HealthWord),
    /// The controller reports the slot as absent
    Absent,
    /// No `Status.State` at all
    Missing,
    Unrecognized(String),
}

impl DriveHealth {
    pub fn from_state(state: Option<&str>) -> Self {
        let Some(state) = state else {
            return DriveHealth::Missing;
        };
        match HealthWord::parse(state) {
            Some(HealthWord::Absent) => DriveHealth::Absent,
            Some(word) => DriveHealth::Scored(word),
            None => DriveHealth::Unrecognized(state.to_string()),
        }
    }

    /// Numeric health; NaN when the drive state gives no usable answer.
    pub fn value(&self) -> f64 {
        match self {
            DriveHealth::Scored(word) => word.score(),
            _ => f64::NAN,
        }
    }
}

fn reported_words() -> &'static Mutex<HashSet<String>> {
    static REPORTED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    REPORTED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Warn about an unknown health word, once per distinct word per process.
/// Returns whether a warning was logged.
pub fn report_unknown_word(word: &str) -> bool {
    let first = match reported_words().lock() {
        Ok(mut seen) => seen.insert(word.to_lowercase()),
        Err(poisoned) => poisoned.into_inner().insert(word.to_lowercase()),
    };
    if first {
        warn!("Unknown health state '{}', reporting health as NaN", word);
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ok_scores_one() {
        for word in HealthWord::ALL {
            let expected = if word == HealthWord::Ok { 1.0 } else { 0.0 };
            assert_eq!(word.score(), expected, "{}", word.as_str());
        }
    }

    #[test]
    fn words_parse_case_insensitively() {
        assert_eq!(HealthWord::parse("OK"), Some(HealthWord::Ok));
        assert_eq!(HealthWord::parse("Not Available"), Some(HealthWord::NotAvailable));
        assert_eq!(HealthWord::parse("Non-Critical"), Some(HealthWord::NonCritical));
        assert_eq!(HealthWord::parse("degraded"), None);
        for word in HealthWord::ALL {
            assert_eq!(HealthWord::parse(word.as_str()), Some(word));
        }
    }

    #[test]
    fn absent_missing_and_unknown_are_nan() {
        assert!(DriveHealth::from_state(Some("Absent")).value().is_nan());
        assert!(DriveHealth::from_state(None).value().is_nan());
        assert!(DriveHealth::from_state(Some("Degraded")).value().is_nan());
        assert_eq!(DriveHealth::from_state(Some("OK")).value(), 1.0);
        assert_eq!(DriveHealth::from_state(Some("Enabled")).value(), 0.0);
    }

    #[test]
    fn unknown_words_are_reported_once() {
        assert!(report_unknown_word("Rebuilding-status-test"));
        assert!(!report_unknown_word("rebuilding-STATUS-test"));
    }
}
