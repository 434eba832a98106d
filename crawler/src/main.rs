use anyhow::Result;
use chrono::{DateTime, Utc};
use shared::{BitstampClient, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod services;

use crate::services::{Crawler, RunOutcome};

fn build_info() -> String {
    let built = env!("BUILD_TIME")
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "v{} ({}@{}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("GIT_BRANCH"),
        built
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Bitstamp stats crawler {}", build_info());

    let config = Config::from_env()?;
    info!(
        "Writing history to {:?}, cooldown {:?}",
        config.data_dir, config.cooldown
    );

    let client = BitstampClient::from_config(&config)?;
    let crawler = Crawler::from_config(client, &config);
    let summary = crawler.run().await;

    let elapsed = Utc::now() - summary.started_at;
    info!(
        "Crawled {} coins in {}s: {} written, {} unchanged, {} fetch failures, {} store failures",
        summary.coins,
        elapsed.num_seconds(),
        summary.written,
        summary.unchanged,
        summary.fetch_failures,
        summary.store_failures
    );

    // Exit code stays 0 on rate limiting
    if summary.outcome == RunOutcome::RateLimited {
        info!("Stopped early: API rate limit reached");
    }

    Ok(())
}
