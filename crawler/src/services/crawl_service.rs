//! Crawl loop: coins x metrics, fetch -> load -> merge -> save

use chrono::{DateTime, Utc};
use shared::{merge, Config, FetchError, HistoryStore, Metric, StatsSource, StoreError};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOutcome {
    #[default]
    Completed,
    /// The exchange answered 429 and the run stopped early.
    RateLimited,
}

/// What happened to one (coin, metric)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Written,
    /// Nothing new arrived, the file was left alone
    Unchanged,
    FetchFailed,
    StoreFailed,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub coins: usize,
    pub written: usize,
    pub unchanged: usize,
    pub fetch_failures: usize,
    pub store_failures: usize,
    pub outcome: RunOutcome,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            coins: 0,
            written: 0,
            unchanged: 0,
            fetch_failures: 0,
            store_failures: 0,
            outcome: RunOutcome::Completed,
        }
    }

    fn record(&mut self, step: Step) {
        match step {
            Step::Written => self.written += 1,
            Step::Unchanged => self.unchanged += 1,
            Step::FetchFailed => self.fetch_failures += 1,
            Step::StoreFailed => self.store_failures += 1,
        }
    }
}

pub struct Crawler<S> {
    source: S,
    store: HistoryStore,
    cooldown: Duration,
    coins: Option<Vec<String>>,
}

impl<S: StatsSource> Crawler<S> {
    pub fn new(source: S, store: HistoryStore, cooldown: Duration) -> Self {
        Self {
            source,
            store,
            cooldown,
            coins: None,
        }
    }

    pub fn from_config(source: S, config: &Config) -> Self {
        Self::new(source, HistoryStore::new(&config.data_dir), config.cooldown)
            .with_coins(config.coins.clone())
    }

    /// Crawl only these coins instead of discovering them
    pub fn with_coins(mut self, coins: Option<Vec<String>>) -> Self {
        self.coins = coins;
        self
    }

    /// Run one full pass. Stops at the first rate-limit response.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::new();

        let coins = match self.resolve_coins().await {
            Ok(coins) => coins,
            Err(e) if e.is_rate_limited() => {
                warn!("{}, stopping", e);
                summary.outcome = RunOutcome::RateLimited;
                return summary;
            }
            Err(e) => {
                warn!("coin discovery failed: {}", e);
                Vec::new()
            }
        };
        info!("crawling {} coins", coins.len());

        for coin in &coins {
            info!("{}", coin);
            summary.coins += 1;

            for metric in Metric::ALL {
                match self.crawl_metric(coin, metric).await {
                    Ok(step) => summary.record(step),
                    Err(e) => {
                        warn!("{}, stopping", e);
                        summary.outcome = RunOutcome::RateLimited;
                        return summary;
                    }
                }
                tokio::time::sleep(self.cooldown).await;
            }
        }

        summary
    }

    async fn resolve_coins(&self) -> Result<Vec<String>, FetchError> {
        match &self.coins {
            Some(coins) => Ok(coins.clone()),
            None => self.source.list_coins().await,
        }
    }

    /// Update one history file.
    ///
    /// Only a rate-limit error is returned; every other failure is logged
    /// and folded into the returned [`Step`].
    pub async fn crawl_metric(&self, coin: &str, metric: Metric) -> Result<Step, FetchError> {
        let incoming = match self.source.fetch_series(coin, metric).await {
            Ok(series) => series,
            Err(e) if e.is_rate_limited() => return Err(e),
            Err(e) => {
                warn!("{} {}: {}", metric, coin, e);
                return Ok(Step::FetchFailed);
            }
        };

        // An empty batch only matters for a pair we have never stored
        if incoming.is_empty() && self.store.exists(metric, coin) {
            debug!("{} {}: no records", metric, coin);
            return Ok(Step::Unchanged);
        }

        let previous = match self.store.load(metric, coin) {
            Ok(series) => series,
            Err(e @ StoreError::Corrupt { .. }) => {
                warn!("{}", e);
                match self.store.quarantine(metric, coin) {
                    Ok(moved) => warn!("moved unreadable history to {}", moved.display()),
                    Err(e) => {
                        warn!("{}", e);
                        return Ok(Step::StoreFailed);
                    }
                }
                Vec::new()
            }
            Err(e) => {
                warn!("{}", e);
                return Ok(Step::StoreFailed);
            }
        };

        let known = previous.len();
        let merged = merge(previous, incoming);
        if let Err(e) = self.store.save(metric, coin, &merged) {
            warn!("{}", e);
            return Ok(Step::StoreFailed);
        }

        debug!(
            "{} {}: {} records ({} new)",
            metric,
            coin,
            merged.len(),
            merged.len() - known
        );
        Ok(Step::Written)
    }
}
