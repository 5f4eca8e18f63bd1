//! Plain-HTTP page fetcher, the cheap first strategy for every gym site.

use std::future::Future;
use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::Client;

use matfinder_core::types::{FetchStrategy, PageFetchResult};

use crate::error::ScraperError;
use crate::rate_limit::{backoff_delay, RateGate};

/// Fixed pool of desktop user agents, one chosen at random per request.
/// Some gym sites serve different (or no) markup to obvious bot agents.
pub(crate) const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Version/17.4 Safari/605.1.15",
];

pub(crate) fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// A page-fetching strategy. Both fetchers (and test fakes) implement this;
/// the orchestrator is generic over it so fallback logic can be exercised
/// without network access.
pub trait FetchPage {
    fn fetch(&self, url: &str) -> impl Future<Output = PageFetchResult> + Send;
}

/// HTTP GET fetcher with per-instance pacing, per-request random user agent,
/// and bounded retry.
///
/// Any non-2xx status is treated as a retryable failure even when a body was
/// returned. The final failure surfaces inside the [`PageFetchResult`], not
/// as an `Err`, so the orchestrator can apply the browser fallback.
pub struct HttpFetcher {
    client: Client,
    gate: RateGate,
    /// Total attempts per URL, not additional retries.
    max_attempts: u32,
    backoff_base_ms: u64,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the configured timeout, pacing interval,
    /// and retry policy. `max_attempts` is clamped to at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        min_interval_ms: u64,
        max_attempts: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            gate: RateGate::new(min_interval_ms),
            max_attempts: max_attempts.max(1),
            backoff_base_ms,
        })
    }

    async fn attempt(&self, url: &str) -> Result<(String, u16), ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, random_user_agent())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        Ok((body, status.as_u16()))
    }
}

impl FetchPage for HttpFetcher {
    async fn fetch(&self, url: &str) -> PageFetchResult {
        let mut errors: Vec<String> = Vec::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(backoff_delay(self.backoff_base_ms, attempt - 1)).await;
            }
            self.gate.wait().await;

            match self.attempt(url).await {
                Ok((html, status)) => {
                    tracing::debug!(target: "matfinder::fetch", url, status, attempt, "fetched page over http");
                    return PageFetchResult::success(
                        url.to_owned(),
                        html,
                        Some(status),
                        FetchStrategy::Http,
                    );
                }
                Err(err) => {
                    tracing::warn!(target: "matfinder::fetch", url, attempt, error = %err, "http fetch attempt failed");
                    errors.push(format!("attempt {attempt}: {err}"));
                }
            }
        }

        PageFetchResult::failure(url.to_owned(), errors, FetchStrategy::Http)
    }
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
