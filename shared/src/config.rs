use anyhow::Context;
use dotenv::dotenv;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.bitstamp.net";
pub const DEFAULT_DATA_DIR: &str = "./data";
/// 8000 requests per 10 minutes, see `REQUEST LIMITS` at https://www.bitstamp.net/api/
pub const DEFAULT_COOLDOWN_MS: u64 = 75;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub data_dir: PathBuf,
    /// Pause after every stats request
    pub cooldown: Duration,
    pub http_timeout: Option<Duration>,
    /// Explicit coin list; discovery is skipped when set
    pub coins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            http_timeout: None,
            coins: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Blank values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let cooldown_ms = match var("COOLDOWN_MS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("COOLDOWN_MS must be milliseconds, got {:?}", v))?,
            None => DEFAULT_COOLDOWN_MS,
        };

        let http_timeout = match var("HTTP_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(v.parse::<u64>().with_context(|| {
                format!("HTTP_TIMEOUT_SECS must be seconds, got {:?}", v)
            })?)),
            None => None,
        };

        Ok(Config {
            base_url: var("BITSTAMP_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            data_dir: var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            cooldown: Duration::from_millis(cooldown_ms),
            http_timeout,
            coins: var("CRAWL_COINS")
                .map(|v| parse_coin_list(&v))
                .filter(|coins| !coins.is_empty()),
        })
    }
}

/// "BTC, eth,,btc" -> ["btc", "eth"]
pub fn parse_coin_list(raw: &str) -> Vec<String> {
    let mut coins: Vec<String> = raw
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    coins.sort();
    coins.dedup();
    coins
}
