//! Gym-site scraping: rate-limited fetchers, extractors, normalizers, and
//! the per-gym orchestrator.

pub mod browser;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod rate_limit;
pub mod scraper;

pub use browser::BrowserFetcher;
pub use error::ScraperError;
pub use fetch::{FetchPage, HttpFetcher};
pub use scraper::Scraper;
