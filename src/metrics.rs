//! Sample sinks: Prometheus exposition and in-memory capture.

pub mod sink;

pub use sink::{Labels, MemorySink, MetricSink, PrometheusSink, Sample};
