//! Metric sink seam and its two implementations.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

use crate::error::Result;

pub type Labels = BTreeMap<String, String>;

/// Accepts named, labeled numeric samples.
pub trait MetricSink: Send {
    fn add_sample(&mut self, name: &str, value: f64, labels: &Labels);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub value: f64,
    pub labels: Labels,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();
        write!(f, "{}{{{}}} {}", self.name, labels.join(","), self.value)
    }
}

/// Keeps every sample in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Vec<Sample>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Sample> + 'a {
        self.samples.iter().filter(move |s| s.name == name)
    }
}

impl MetricSink for MemorySink {
    fn add_sample(&mut self, name: &str, value: f64, labels: &Labels) {
        self.samples.push(Sample {
            name: name.to_string(),
            value,
            labels: labels.clone(),
        });
    }
}

/// Builds a scrape-local Prometheus registry, one gauge family per sample name.
pub struct PrometheusSink {
    registry: Registry,
    families: HashMap<String, (Vec<String>, GaugeVec)>,
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: HashMap::new(),
        }
    }

    fn family(&mut self, name: &str, label_names: Vec<String>) -> Option<&(Vec<String>, GaugeVec)> {
        if !self.families.contains_key(name) {
            let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
            let created = GaugeVec::new(Opts::new(name, help_for(name)), &names)
                .and_then(|gauge| self.registry.register(Box::new(gauge.clone())).map(|_| gauge));
            match created {
                Ok(gauge) => {
                    self.families.insert(name.to_string(), (label_names, gauge));
                }
                Err(e) => {
                    warn!("Dropping metric {}: {}", name, e);
                    return None;
                }
            }
        }
        self.families.get(name)
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for PrometheusSink {
    fn add_sample(&mut self, name: &str, value: f64, labels: &Labels) {
        let label_names: Vec<String> = labels.keys().cloned().collect();
        let Some((expected, gauge)) = self.family(name, label_names.clone()) else {
            return;
        };

        if *expected != label_names {
            warn!("Dropping sample {}: label set {:?} does not match {:?}", name, label_names, expected);
            return;
        }

        let values: Vec<&str> = labels.values().map(String::as_str).collect();
        match gauge.get_metric_with_label_values(&values) {
            Ok(gauge) => gauge.set(value),
            Err(e) => warn!("Dropping sample {}: {}", name, e),
        }
    }
}

fn help_for(name: &str) -> &'static str {
    match name {
        "redfish_up" => "Redfish Server Monitoring availability",
        "redfish_response_duration_seconds" => "Redfish Server Monitoring response time",
        "redfish_health_scrape_duration_seconds" => "Redfish Server Monitoring redfish health scrape duration in seconds",
        _ => "Redfish Server Monitoring Health Data",
    }
}
