//! Write side: enrichment results become sparse patches against the gyms
//! table.
//!
//! The central invariant: a patch contains a column if and only if the
//! scrape produced a genuinely new, non-empty value for it. "No signal
//! found" must never overwrite a previously known field with null/empty.
//! Every patch field is `Option` and the UPDATE wraps each column in
//! `COALESCE`, so unset fields leave the stored value untouched.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use matfinder_core::types::GymEnrichmentResult;

/// Sparse partial update for one gym row. Every content field is optional;
/// `last_scraped_at` is always set.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentPatch {
    pub gym_id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub head_coach: Option<String>,
    pub coaches: Option<Vec<String>>,
    pub affiliation: Option<String>,
    pub lineage: Option<String>,
    pub style_focus: Option<String>,
    pub instagram: Option<String>,
    pub has_gi: Option<bool>,
    pub has_nogi: Option<bool>,
    pub has_open_mat: Option<bool>,
    pub has_drop_in: Option<bool>,
    pub last_scraped_at: DateTime<Utc>,
}

impl EnrichmentPatch {
    /// Number of content fields set (the timestamp does not count).
    #[must_use]
    pub fn content_field_count(&self) -> usize {
        let mut count = usize::from(self.email.is_some());
        count += usize::from(self.phone.is_some());
        count += usize::from(self.address.is_some());
        count += usize::from(self.postcode.is_some());
        count += usize::from(self.city.is_some());
        count += usize::from(self.head_coach.is_some());
        count += usize::from(self.coaches.is_some());
        count += usize::from(self.affiliation.is_some());
        count += usize::from(self.lineage.is_some());
        count += usize::from(self.style_focus.is_some());
        count += usize::from(self.instagram.is_some());
        count += usize::from(self.has_gi.is_some());
        count += usize::from(self.has_nogi.is_some());
        count += usize::from(self.has_open_mat.is_some());
        count += usize::from(self.has_drop_in.is_some());
        count
    }

    /// True when there is nothing new to write; such patches never reach
    /// the store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content_field_count() == 0
    }
}

/// Builds the patch for one enrichment result.
///
/// One representative value per contact field (the first email / first
/// phone), keyword flags only when positively detected, and the coach list
/// only when non-empty.
#[must_use]
pub fn build_patch(result: &GymEnrichmentResult) -> EnrichmentPatch {
    let first_non_empty = |values: &[String]| -> Option<String> {
        values.iter().find(|v| !v.trim().is_empty()).cloned()
    };
    let keyword = |flag: Option<bool>| -> Option<bool> {
        // Only positive detections; never write an absence.
        flag.filter(|&v| v).map(|_| true)
    };

    EnrichmentPatch {
        gym_id: result.gym_id,
        email: first_non_empty(&result.contacts.emails),
        phone: first_non_empty(&result.contacts.phones),
        address: result.address.clone().filter(|v| !v.trim().is_empty()),
        postcode: result.postcode.clone().filter(|v| !v.trim().is_empty()),
        city: result.city.clone().filter(|v| !v.trim().is_empty()),
        head_coach: result.head_coach.clone().filter(|v| !v.trim().is_empty()),
        coaches: if result.coaches.is_empty() {
            None
        } else {
            Some(result.coaches.clone())
        },
        affiliation: result.affiliation.clone().filter(|v| !v.trim().is_empty()),
        lineage: result.lineage.clone().filter(|v| !v.trim().is_empty()),
        style_focus: result.style_focus.clone().filter(|v| !v.trim().is_empty()),
        instagram: result.instagram.clone().filter(|v| !v.trim().is_empty()),
        has_gi: keyword(result.keywords.gi),
        has_nogi: keyword(result.keywords.nogi),
        has_open_mat: keyword(result.keywords.open_mat),
        has_drop_in: keyword(result.keywords.drop_in),
        last_scraped_at: result.fetched_at,
    }
}

/// Bounded-retry policy for a single row update: `max_attempts` total tries
/// with a linear backoff of `backoff_ms * attempt` between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

/// Outcome counts for one persistence pass. Always satisfies
/// `updated + skipped + failures <= attempted` and
/// `attempted == results.len()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub attempted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: usize,
}

impl std::fmt::Display for PersistSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempted {} | updated {} | skipped {} | failed {}",
            self.attempted, self.updated, self.skipped, self.failures
        )
    }
}

/// Writes each non-empty patch with bounded retry.
///
/// Per result: an empty patch counts as `skipped` with no write attempted;
/// a write that matches no row counts as `skipped`; an error that survives
/// all retries counts as `failures`; a confirmed write (at least one row
/// affected) counts as `updated`. No per-gym failure aborts the batch.
pub async fn persist_enrichments(
    pool: &PgPool,
    results: &[GymEnrichmentResult],
    retry: RetryPolicy,
) -> PersistSummary {
    let mut summary = PersistSummary {
        attempted: results.len(),
        ..PersistSummary::default()
    };

    for result in results {
        let patch = build_patch(result);
        if patch.is_empty() {
            tracing::debug!(target: "matfinder::persist", gym_id = result.gym_id, "nothing new to write");
            summary.skipped += 1;
            continue;
        }

        let written = with_retry(retry, || apply_patch(pool, &patch)).await;
        record_write_outcome(&mut summary, &patch, &written);
    }

    summary
}

/// Folds one write result into the summary: confirmed rows are `updated`,
/// zero rows matched is `skipped`, an exhausted retry is `failures`.
fn record_write_outcome(
    summary: &mut PersistSummary,
    patch: &EnrichmentPatch,
    written: &Result<u64, sqlx::Error>,
) {
    match written {
        Ok(rows) if *rows > 0 => {
            tracing::info!(
                target: "matfinder::persist",
                gym_id = patch.gym_id,
                fields = patch.content_field_count(),
                "gym enrichment persisted"
            );
            summary.updated += 1;
        }
        Ok(_) => {
            tracing::warn!(target: "matfinder::persist", gym_id = patch.gym_id, "no gym row matched id");
            summary.skipped += 1;
        }
        Err(err) => {
            tracing::error!(target: "matfinder::persist", gym_id = patch.gym_id, error = %err, "persist failed after retries");
            summary.failures += 1;
        }
    }
}

/// Runs `operation` up to `max_attempts` times, sleeping `backoff_ms *
/// attempt` between tries. The operation is injected so the retry schedule
/// can be exercised without a database.
async fn with_retry<T, F, Fut>(retry: RetryPolicy, mut operation: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(
                    target: "matfinder::persist",
                    attempt,
                    max_attempts,
                    error = %err,
                    "update failed — retrying after backoff"
                );
                let delay = retry.backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Applies one patch and returns the affected-row count.
///
/// `COALESCE($n, gyms.column)` keeps the existing value for every field the
/// patch left unset, so absent signals never null out prior enrichment.
async fn apply_patch(pool: &PgPool, patch: &EnrichmentPatch) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE gyms SET \
           email           = COALESCE($2,  gyms.email), \
           phone           = COALESCE($3,  gyms.phone), \
           address         = COALESCE($4,  gyms.address), \
           postcode        = COALESCE($5,  gyms.postcode), \
           city            = COALESCE($6,  gyms.city), \
           head_coach      = COALESCE($7,  gyms.head_coach), \
           coaches         = COALESCE($8,  gyms.coaches), \
           affiliation     = COALESCE($9,  gyms.affiliation), \
           lineage         = COALESCE($10, gyms.lineage), \
           style_focus     = COALESCE($11, gyms.style_focus), \
           instagram       = COALESCE($12, gyms.instagram), \
           has_gi          = COALESCE($13, gyms.has_gi), \
           has_nogi        = COALESCE($14, gyms.has_nogi), \
           has_open_mat    = COALESCE($15, gyms.has_open_mat), \
           has_drop_in     = COALESCE($16, gyms.has_drop_in), \
           last_scraped_at = $17 \
         WHERE id = $1",
    )
    .bind(patch.gym_id)
    .bind(&patch.email)
    .bind(&patch.phone)
    .bind(&patch.address)
    .bind(&patch.postcode)
    .bind(&patch.city)
    .bind(&patch.head_coach)
    .bind(&patch.coaches)
    .bind(&patch.affiliation)
    .bind(&patch.lineage)
    .bind(&patch.style_focus)
    .bind(&patch.instagram)
    .bind(patch.has_gi)
    .bind(patch.has_nogi)
    .bind(patch.has_open_mat)
    .bind(patch.has_drop_in)
    .bind(patch.last_scraped_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use matfinder_core::types::{GymEnrichmentResult, GymSeed};

    use super::*;

    fn seed() -> GymSeed {
        GymSeed {
            id: 42,
            name: "Mat Monkeys".to_owned(),
            website: Some("https://matmonkeys.co.uk".to_owned()),
            borough: None,
        }
    }

    #[test]
    fn empty_result_builds_empty_patch() {
        let result = GymEnrichmentResult::empty(&seed());
        let patch = build_patch(&result);
        assert!(patch.is_empty());
        assert_eq!(patch.gym_id, 42);
    }

    #[test]
    fn only_first_email_is_taken() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.contacts.emails =
            vec!["a@gym.co.uk".to_owned(), "b@gym.co.uk".to_owned()];
        let patch = build_patch(&result);
        assert_eq!(patch.email.as_deref(), Some("a@gym.co.uk"));
    }

    #[test]
    fn single_email_patch_has_exactly_one_content_field() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.contacts.emails = vec!["a@b.com".to_owned()];
        let patch = build_patch(&result);
        assert_eq!(patch.content_field_count(), 1);
        assert!(!patch.is_empty());
        // The timestamp always rides along but is not a content field.
        assert_eq!(patch.last_scraped_at, result.fetched_at);
    }

    #[test]
    fn keyword_flags_only_set_when_positively_detected() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.keywords.nogi = Some(true);
        result.keywords.gi = None;
        let patch = build_patch(&result);
        assert_eq!(patch.has_nogi, Some(true));
        assert_eq!(patch.has_gi, None);
        assert_eq!(patch.content_field_count(), 1);
    }

    #[test]
    fn explicit_false_keyword_is_never_written() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.keywords.gi = Some(false);
        let patch = build_patch(&result);
        assert_eq!(patch.has_gi, None);
        assert!(patch.is_empty());
    }

    #[test]
    fn empty_coach_list_is_omitted() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.coaches = Vec::new();
        let patch = build_patch(&result);
        assert!(patch.coaches.is_none());

        result.coaches = vec!["Ana Costa".to_owned()];
        let patch = build_patch(&result);
        assert_eq!(patch.coaches.as_deref(), Some(&["Ana Costa".to_owned()][..]));
    }

    #[test]
    fn whitespace_only_values_do_not_count() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.address = Some("   ".to_owned());
        result.contacts.phones = vec![String::new()];
        let patch = build_patch(&result);
        assert!(patch.is_empty());
    }

    #[tokio::test]
    async fn retry_returns_first_success_without_extra_calls() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_ms: 0,
        };
        let result = with_retry(policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u64, sqlx::Error>(1)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_recovers_after_transient_errors() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_ms: 0,
        };
        let result = with_retry(policy, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(1u64)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "2 failures + 1 success expected"
        );
    }

    #[tokio::test]
    async fn retry_stops_after_max_attempts() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff_ms: 0,
        };
        let result = with_retry(policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u64, _>(sqlx::Error::PoolTimedOut)
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_max_attempts_still_tries_once() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff_ms: 0,
        };
        let result = with_retry(policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u64, _>(sqlx::Error::PoolTimedOut)
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn write_outcomes_are_counted_into_the_summary() {
        let mut result = GymEnrichmentResult::empty(&seed());
        result.contacts.emails = vec!["a@gym.co.uk".to_owned()];
        let patch = build_patch(&result);

        let mut summary = PersistSummary {
            attempted: 3,
            ..PersistSummary::default()
        };
        record_write_outcome(&mut summary, &patch, &Ok(1));
        record_write_outcome(&mut summary, &patch, &Ok(0));
        record_write_outcome(&mut summary, &patch, &Err(sqlx::Error::PoolTimedOut));

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failures, 1);
        assert!(summary.updated + summary.skipped + summary.failures <= summary.attempted);
    }

    #[test]
    fn timestamp_comes_from_the_result_not_now() {
        let mut result = GymEnrichmentResult::empty(&seed());
        let fetched = Utc::now() - chrono::Duration::hours(3);
        result.fetched_at = fetched;
        let patch = build_patch(&result);
        assert_eq!(patch.last_scraped_at, fetched);
    }
}
