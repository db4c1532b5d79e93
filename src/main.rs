//! cbng-monitoring - Contribution Freshness Exporter
//!
//! Serves `/metrics` with the last contribution time of each configured wiki
//! account, and `/health` for liveness probes.

use anyhow::Result;
use cbng_monitoring::{app::App, cli::Cli, config::Config};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG takes precedence over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("cbng-monitoring starting up...");

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Listen Address: {}", config.server.listen_address);
    match &config.api.base_url {
        Some(url) => info!("API Base URL: {}", url),
        None => info!("API Scheme: {}", config.api.scheme),
    }
    info!("User Agent: {}", config.api.user_agent);
    match config.api.timeout_seconds {
        Some(secs) => info!("API Timeout: {}s", secs),
        None => info!("API Timeout: client default"),
    }
    for target in &config.targets {
        info!("Poll Target: {}", target);
    }
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(config).build(shutdown_rx).await?;

    let signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Shutdown signal received. Shutting down gracefully...");
        let _ = shutdown_tx.send(true);
    };

    app.run_until(signal).await?;
    info!("Exiting.");
    Ok(())
}
