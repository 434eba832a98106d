//! Bitstamp stats API client

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{coins_from_pairs, Metric, Series, TradingPair};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Where the crawler gets its data from.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Coins to crawl, lowercase, deduplicated and sorted
    async fn list_coins(&self) -> Result<Vec<String>, FetchError>;

    /// Latest batch of records for one coin and metric, in API order
    async fn fetch_series(&self, coin: &str, metric: Metric) -> Result<Series, FetchError>;
}

#[derive(Debug, Clone)]
pub struct BitstampClient {
    base_url: String,
    client: reqwest::Client,
}

impl BitstampClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, None)
    }

    /// No timeout means a hanging request blocks the run.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config.base_url.clone(), config.http_timeout)
    }

    pub fn stats_url(&self, coin: &str, metric: Metric) -> String {
        format!(
            "{}/api-internal/stats/v1/{}/{}",
            self.base_url,
            coin,
            metric.path()
        )
    }

    pub fn pairs_url(&self) -> String {
        format!("{}/api/v2/trading-pairs-info/", self.base_url)
    }

    /// GET `url` and parse the body. Anything but 200 is an error.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Pull the record array stored under `field` out of a response body.
pub fn extract_series(body: Value, url: &str, field: &'static str) -> Result<Series, FetchError> {
    let data = match body {
        Value::Object(mut map) => map.remove(field),
        _ => None,
    }
    .ok_or_else(|| FetchError::MissingField {
        url: url.to_string(),
        field,
    })?;

    serde_json::from_value(data).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl StatsSource for BitstampClient {
    async fn list_coins(&self) -> Result<Vec<String>, FetchError> {
        let url = self.pairs_url();
        let body = self.get_json(&url).await?;
        let pairs: Vec<TradingPair> =
            serde_json::from_value(body).map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        let coins = coins_from_pairs(&pairs);
        debug!("{} trading pairs, {} coins", pairs.len(), coins.len());
        Ok(coins)
    }

    async fn fetch_series(&self, coin: &str, metric: Metric) -> Result<Series, FetchError> {
        let url = self.stats_url(coin, metric);
        let body = self.get_json(&url).await?;
        extract_series(body, &url, metric.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls() {
        let client = BitstampClient::new("https://www.bitstamp.net/").unwrap();
        assert_eq!(
            client.stats_url("btc", Metric::LargeTransactions),
            "https://www.bitstamp.net/api-internal/stats/v1/btc/financial/large_transactions"
        );
        assert_eq!(
            client.pairs_url(),
            "https://www.bitstamp.net/api/v2/trading-pairs-info/"
        );
    }

    #[test]
    fn test_extract_series() {
        let body = json!({
            "txsStats": [
                {"date": "2024-01-02", "txs": 7},
                {"date": "2024-01-01", "txs": 5}
            ]
        });
        let series = extract_series(body, "u", "txsStats").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date(), &json!("2024-01-02"));
        assert_eq!(series[1].get("txs"), Some(&json!(5)));
    }

    #[test]
    fn test_extract_series_missing_field() {
        let err = extract_series(json!({"price": []}), "u", "largeTxs").unwrap_err();
        assert!(matches!(err, FetchError::MissingField { field: "largeTxs", .. }));

        let err = extract_series(json!([1, 2]), "u", "price").unwrap_err();
        assert!(matches!(err, FetchError::MissingField { .. }));
    }

    #[test]
    fn test_extract_series_not_records() {
        let err = extract_series(json!({"price": {"date": "x"}}), "u", "price").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));

        let err = extract_series(json!({"price": [{"value": 1}]}), "u", "price").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
