//! Rollover daemon entry point
//!
//! ## Usage
//!
//! ```bash
//! # Run forever, evaluating every 5 minutes
//! rollover --config /etc/rollover/config.yml
//!
//! # Custom interval
//! rollover --config config.yml --interval 60
//!
//! # Single evaluation cycle (cron-style operation)
//! rollover --config config.yml --once
//! ```

use anyhow::Context;
use clap::Parser;
use rollover::{Config, EngineClient, scheduler};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rolls over Elasticsearch write aliases and optimizes retired indices
#[derive(Parser)]
#[command(name = "rollover")]
#[command(about = "Alias rollover and post-rollover optimization daemon", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: String,

    /// Seconds between evaluation cycles
    #[arg(long, default_value_t = scheduler::DEFAULT_INTERVAL.as_secs())]
    interval: u64,

    /// Run a single evaluation cycle, wait for it, and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let cfg = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;

    if cfg.rollover.is_empty() {
        warn!("no rollover rules configured, nothing to do");
    }

    let engine = Arc::new(
        EngineClient::new(&cfg.elasticsearch.endpoints)
            .context("Elasticsearch connection error")?,
    );

    info!(
        endpoints = ?cfg.elasticsearch.endpoints,
        rules = cfg.rollover.len(),
        interval_secs = cli.interval,
        "rollover daemon starting"
    );

    if cli.once {
        scheduler::run_once(engine, &cfg.rollover).await;
        return Ok(());
    }

    scheduler::run_forever(engine, cfg.rollover, Duration::from_secs(cli.interval)).await;
    Ok(())
}
