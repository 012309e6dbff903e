//! Command-line argument definitions (clap).

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "redfish-smart-exporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prometheus exporter for drive SMART data read over Redfish", long_about = None)]
pub struct Args {
    /// Specify config yaml file
    #[arg(short = 'c', long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log all messages to a file
    #[arg(short = 'l', long, value_name = "FILE")]
    pub logging: Option<PathBuf>,

    /// Debugging mode
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Collect once from TARGET, print the samples and exit
    #[arg(long, value_name = "TARGET")]
    pub test: Option<String>,
}

impl Args {
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
