pub mod crawl_service;

pub use crawl_service::{Crawler, RunOutcome};
