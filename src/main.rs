//! Exporter entry point: CLI dispatch, logging, config and server start.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use redfish_smart_exporter::app::cli::Args;
use redfish_smart_exporter::app::logging::init_tracing;
use redfish_smart_exporter::config::load_config;
use redfish_smart_exporter::metrics::MemorySink;
use redfish_smart_exporter::server::{collect_target, serve};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = init_tracing(args.log_filter(), args.logging.as_deref()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Test mode
    if let Some(target) = args.test.as_deref() {
        info!("Running in test mode against {}", target);
        let mut sink = MemorySink::new();
        let summary = collect_target(&config, target, &mut sink).await?;
        for sample in sink.samples() {
            println!("{}", sample);
        }
        info!(
            "Target {}: reachable={}, {} drives in {} seconds",
            target, summary.reachable, summary.drives_visited, summary.duration_seconds
        );
        return Ok(());
    }

    serve(config).await?;
    Ok(())
}
