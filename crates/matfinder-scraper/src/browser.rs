//! Headless-browser fallback fetcher.
//!
//! Some gym sites render contact details entirely client-side; a plain HTTP
//! GET returns an empty shell. This fetcher launches one shared Chrome
//! process lazily on first use and reuses it for every subsequent call. Each
//! fetch opens a fresh tab, navigates with a timeout, captures the rendered
//! HTML, and closes the tab. The browser process itself lives until
//! [`BrowserFetcher::close`] (or drop).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptionsBuilder};

use matfinder_core::types::{FetchStrategy, PageFetchResult};

use crate::error::ScraperError;
use crate::fetch::{random_user_agent, FetchPage};
use crate::rate_limit::RateGate;

/// Delay after the load event before capturing content, so client-side
/// rendering has a chance to populate the DOM.
const RENDER_SETTLE: Duration = Duration::from_millis(750);

/// Keep-alive for the shared browser process. The default idle timeout is
/// far too short for runs where most gyms never need the fallback.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct BrowserFetcher {
    /// Lazily launched shared browser; `None` until the first fetch.
    browser: Arc<Mutex<Option<Browser>>>,
    gate: Arc<RateGate>,
    nav_timeout: Duration,
}

impl BrowserFetcher {
    #[must_use]
    pub fn new(nav_timeout_secs: u64, min_interval_ms: u64) -> Self {
        Self {
            browser: Arc::new(Mutex::new(None)),
            gate: Arc::new(RateGate::new(min_interval_ms)),
            nav_timeout: Duration::from_secs(nav_timeout_secs),
        }
    }

    /// Shuts down the shared browser process. A no-op if no fetch ever
    /// launched one; safe to call more than once.
    pub async fn close(&self) {
        let slot = Arc::clone(&self.browser);
        let closed = tokio::task::spawn_blocking(move || {
            slot.lock().ok().and_then(|mut guard| guard.take()).is_some()
        })
        .await
        .unwrap_or(false);
        if closed {
            tracing::info!(target: "matfinder::browser", "closed shared headless browser");
        }
    }
}

impl FetchPage for BrowserFetcher {
    async fn fetch(&self, url: &str) -> PageFetchResult {
        self.gate.wait().await;

        let slot = Arc::clone(&self.browser);
        let target = url.to_owned();
        let nav_timeout = self.nav_timeout;
        let rendered =
            tokio::task::spawn_blocking(move || render_page(&slot, &target, nav_timeout)).await;

        match rendered {
            Ok(Ok(html)) if !html.trim().is_empty() => {
                tracing::debug!(target: "matfinder::browser", url, bytes = html.len(), "rendered page in browser");
                PageFetchResult::success(url.to_owned(), html, None, FetchStrategy::Browser)
            }
            Ok(Ok(_)) => PageFetchResult::failure(
                url.to_owned(),
                vec!["browser returned an empty document".to_owned()],
                FetchStrategy::Browser,
            ),
            Ok(Err(err)) => {
                tracing::warn!(target: "matfinder::browser", url, error = %err, "browser fetch failed");
                PageFetchResult::failure(url.to_owned(), vec![err.to_string()], FetchStrategy::Browser)
            }
            Err(join_err) => PageFetchResult::failure(
                url.to_owned(),
                vec![format!("browser task aborted: {join_err}")],
                FetchStrategy::Browser,
            ),
        }
    }
}

/// Runs on a blocking thread: lazily launch the shared browser, open a tab,
/// navigate, wait for the page to settle, capture the rendered HTML.
///
/// The mutex is held for the whole render, which serializes browser work —
/// consistent with the run's sequential processing model.
fn render_page(
    slot: &Mutex<Option<Browser>>,
    url: &str,
    nav_timeout: Duration,
) -> Result<String, ScraperError> {
    let mut guard = slot
        .lock()
        .map_err(|_| ScraperError::Browser("browser state poisoned".to_owned()))?;

    if guard.is_none() {
        let options = LaunchOptionsBuilder::default()
            .headless(true)
            .sandbox(false)
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|e| ScraperError::Browser(format!("launch options: {e}")))?;
        let browser = Browser::new(options)
            .map_err(|e| ScraperError::Browser(format!("launch failed: {e}")))?;
        tracing::info!(target: "matfinder::browser", "launched shared headless browser");
        *guard = Some(browser);
    }

    let Some(browser) = guard.as_ref() else {
        return Err(ScraperError::Browser("browser unavailable".to_owned()));
    };

    let tab = browser
        .new_tab()
        .map_err(|e| ScraperError::Browser(format!("new tab: {e}")))?;
    tab.set_default_timeout(nav_timeout);
    if let Err(e) = tab.set_user_agent(random_user_agent(), Some("en-GB,en"), None) {
        tracing::debug!(target: "matfinder::browser", error = %e, "could not set tab user agent");
    }

    let html = (|| {
        tab.navigate_to(url)
            .map_err(|e| ScraperError::Browser(format!("navigate: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| ScraperError::Browser(format!("navigation wait: {e}")))?;
        std::thread::sleep(RENDER_SETTLE);
        tab.get_content()
            .map_err(|e| ScraperError::Browser(format!("capture content: {e}")))
    })();

    // Tab lifetime is scoped to one fetch; the browser process is not.
    if let Err(e) = tab.close(true) {
        tracing::debug!(target: "matfinder::browser", error = %e, "tab close failed");
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_is_safe_when_browser_was_never_launched() {
        let fetcher = BrowserFetcher::new(30, 0);
        fetcher.close().await;
        fetcher.close().await;
    }
}
