//! Shared building blocks for the Bitstamp stats crawler
//!
//! - **Models**: metrics, dated records, trading pairs
//! - **Bitstamp**: HTTP client for the stats and trading-pair endpoints
//! - **Data**: merging fetched batches into history and persisting it
//! - **Config**: environment-driven settings

pub mod bitstamp;
pub mod config;
pub mod data;
pub mod error;
pub mod models;

pub use bitstamp::{BitstampClient, StatsSource};
pub use config::Config;
pub use data::{merge, HistoryStore};
pub use error::{FetchError, StoreError};
pub use models::*;
