//! Domain types shared across the enrichment pipeline.
//!
//! [`GymSeed`] is the read-only input loaded from the gyms table.
//! [`PageFetchResult`] is ephemeral, scoped to a single gym's processing.
//! [`GymEnrichmentResult`] is the durable envelope written to the snapshot
//! file and turned into a persistence patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal input record identifying a gym and its website, prior to
/// enrichment. Loaded from storage; immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymSeed {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub borough: Option<String>,
}

/// Deduplicated, normalized contact candidates extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Sparse keyword flags over the fixed vocabulary.
///
/// `None` means "not detected", never "false" — persistence patches must
/// only carry flags that were positively detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDetection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nogi: Option<bool>,
    #[serde(rename = "openMat", skip_serializing_if = "Option::is_none")]
    pub open_mat: Option<bool>,
    #[serde(rename = "dropIn", skip_serializing_if = "Option::is_none")]
    pub drop_in: Option<bool>,
}

/// Street/city/postcode split approximated from page text or JSON-LD.
///
/// `postcode`, when present, is already in canonical UK spacing (`XX1 1XX`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
}

impl AddressParts {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.city.is_none() && self.postcode.is_none()
    }
}

/// Which mechanism produced a page's HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    Http,
    Browser,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Http => write!(f, "http"),
            FetchStrategy::Browser => write!(f, "browser"),
        }
    }
}

/// Terminal outcome of one fetch strategy against one URL.
///
/// Exactly one of `html` or `error` is meaningfully populated; `errors`
/// accumulates every attempt's failure message across retries.
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    pub url: String,
    pub html: Option<String>,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub strategy: FetchStrategy,
    pub errors: Vec<String>,
}

impl PageFetchResult {
    #[must_use]
    pub fn success(url: String, html: String, status: Option<u16>, strategy: FetchStrategy) -> Self {
        Self {
            url,
            html: Some(html),
            status,
            error: None,
            strategy,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(url: String, errors: Vec<String>, strategy: FetchStrategy) -> Self {
        let error = errors.last().cloned();
        Self {
            url,
            html: None,
            status: None,
            error,
            strategy,
            errors,
        }
    }
}

/// The enrichment envelope produced per gym — the unit written to the
/// snapshot file and staged for persistence. Never mutated after creation;
/// a later run supersedes it by gym id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymEnrichmentResult {
    pub gym_id: i64,
    pub gym_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub contacts: ContactDetails,
    pub keywords: KeywordDetection,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_coach: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coaches: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl GymEnrichmentResult {
    /// An envelope with empty contacts and keywords, timestamped now.
    /// Starting point for both failed and successful scrapes.
    #[must_use]
    pub fn empty(seed: &GymSeed) -> Self {
        Self {
            gym_id: seed.id,
            gym_name: seed.name.clone(),
            website: seed.website.clone(),
            contacts: ContactDetails::default(),
            keywords: KeywordDetection::default(),
            fetched_at: Utc::now(),
            source_url: None,
            address: None,
            postcode: None,
            city: None,
            head_coach: None,
            coaches: Vec::new(),
            affiliation: None,
            lineage: None,
            style_focus: None,
            instagram: None,
            errors: Vec::new(),
        }
    }
}

/// What the scraper hands back to the run driver for one gym.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub data: GymEnrichmentResult,
    pub failed: bool,
    pub failure_reason: Option<String>,
    pub raw_html_len: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_detection_serializes_only_set_flags() {
        let kw = KeywordDetection {
            nogi: Some(true),
            ..KeywordDetection::default()
        };
        let json = serde_json::to_value(&kw).unwrap();
        assert_eq!(json, serde_json::json!({ "nogi": true }));
    }

    #[test]
    fn page_fetch_result_failure_carries_last_error() {
        let result = PageFetchResult::failure(
            "https://example.com".to_owned(),
            vec!["attempt 1: timeout".to_owned(), "attempt 2: 503".to_owned()],
            FetchStrategy::Http,
        );
        assert!(result.html.is_none());
        assert_eq!(result.error.as_deref(), Some("attempt 2: 503"));
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn enrichment_result_round_trips_through_json() {
        let seed = GymSeed {
            id: 7,
            name: "Mat Monkeys".to_owned(),
            website: Some("https://matmonkeys.example".to_owned()),
            borough: Some("Hackney".to_owned()),
        };
        let mut result = GymEnrichmentResult::empty(&seed);
        result.contacts.emails.push("hi@matmonkeys.example".to_owned());
        result.keywords.open_mat = Some(true);

        let json = serde_json::to_string(&result).unwrap();
        let back: GymEnrichmentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gym_id, 7);
        assert_eq!(back.contacts.emails, vec!["hi@matmonkeys.example"]);
        assert_eq!(back.keywords.open_mat, Some(true));
        assert!(back.coaches.is_empty());
    }
}
