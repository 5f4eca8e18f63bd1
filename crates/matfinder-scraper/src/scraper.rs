//! Per-gym orchestration: choose a fetch strategy, run the extractors,
//! normalize, and assemble the enrichment envelope.
//!
//! The scraper performs network I/O only — persistence is a separate
//! component invoked by the run driver.

use matfinder_core::types::{GymEnrichmentResult, GymSeed, ScrapeOutcome};

use crate::extract::{
    detect_keywords, extract_address, extract_coaches, extract_emails, extract_jsonld,
    extract_phones, visible_text,
};
use crate::fetch::FetchPage;
use crate::normalize::{dedupe, normalize_email, normalize_phone};

pub struct Scraper<H, B> {
    http: H,
    browser: Option<B>,
}

impl<H: FetchPage, B: FetchPage> Scraper<H, B> {
    pub fn new(http: H, browser: Option<B>) -> Self {
        Self { http, browser }
    }

    /// Runs the fetch-then-extract state machine for one gym.
    ///
    /// A gym without a website fails immediately with zero network calls.
    /// Otherwise the HTTP fetcher goes first; the browser fallback is only
    /// attempted when HTTP yielded no HTML and a browser is configured. A
    /// successful scrape can still carry warnings in `data.errors` (for
    /// example, HTTP attempts that failed before the browser succeeded).
    pub async fn scrape_contacts(&self, gym: &GymSeed) -> ScrapeOutcome {
        let mut data = GymEnrichmentResult::empty(gym);

        let Some(website) = gym.website.as_deref().map(str::trim).filter(|w| !w.is_empty())
        else {
            tracing::info!(target: "matfinder::scraper", gym_id = gym.id, gym = %gym.name, "skipping gym with no website");
            return ScrapeOutcome {
                data,
                failed: true,
                failure_reason: Some("missing website".to_owned()),
                raw_html_len: None,
            };
        };

        let mut fetch = self.http.fetch(website).await;
        let mut all_errors = fetch.errors.clone();

        if fetch.html.is_none() {
            if let Some(browser) = &self.browser {
                tracing::info!(target: "matfinder::scraper", gym_id = gym.id, url = website, "http fetch empty, trying browser fallback");
                fetch = browser.fetch(website).await;
                all_errors.extend(fetch.errors.iter().cloned());
            }
        }

        let Some(html) = fetch.html.as_deref() else {
            let reason = if all_errors.is_empty() {
                "browser fallback failed".to_owned()
            } else {
                all_errors.join("; ")
            };
            tracing::warn!(target: "matfinder::scraper", gym_id = gym.id, url = website, reason = %reason, "all fetch strategies failed");
            data.errors = all_errors;
            return ScrapeOutcome {
                data,
                failed: true,
                failure_reason: Some(reason),
                raw_html_len: None,
            };
        };

        let html_len = html.len();
        enrich_from_html(&mut data, html);
        data.source_url = Some(fetch.url.clone());
        data.errors = all_errors;

        tracing::debug!(
            target: "matfinder::scraper",
            gym_id = gym.id,
            strategy = %fetch.strategy,
            emails = data.contacts.emails.len(),
            phones = data.contacts.phones.len(),
            "extraction complete"
        );

        ScrapeOutcome {
            data,
            failed: false,
            failure_reason: None,
            raw_html_len: Some(html_len),
        }
    }
}

/// Runs all extractors over one page and merges their signals into the
/// envelope. JSON-LD wins for singular fields; the regex extractors fill
/// whatever it left empty.
fn enrich_from_html(data: &mut GymEnrichmentResult, html: &str) {
    data.contacts.emails = dedupe(
        extract_emails(html)
            .iter()
            .map(|e| normalize_email(e))
            .collect(),
    );
    data.contacts.phones = dedupe(
        extract_phones(html)
            .iter()
            .map(|p| normalize_phone(p))
            .collect(),
    );

    let text = visible_text(html);
    data.keywords = detect_keywords(&text);

    let jsonld = extract_jsonld(html);
    let page_address = extract_address(html);
    let coach_signals = extract_coaches(html);

    let (ld_address, ld_city, ld_postcode) = match jsonld.address {
        Some(parts) => (parts.address, parts.city, parts.postcode),
        None => (None, None, None),
    };
    data.address = ld_address.or(page_address.address);
    data.city = ld_city.or(page_address.city);
    data.postcode = ld_postcode.or(page_address.postcode);

    data.head_coach = jsonld.head_coach.or(coach_signals.head_coach);
    let mut coaches = jsonld.coaches;
    coaches.extend(coach_signals.coaches);
    if let Some(head) = &data.head_coach {
        coaches.retain(|c| c != head);
    }
    data.coaches = dedupe(coaches);

    data.affiliation = jsonld.affiliation;
    data.style_focus = jsonld.style_focus;
    data.instagram = jsonld.instagram;
}

#[cfg(test)]
#[path = "scraper_test.rs"]
mod tests;
