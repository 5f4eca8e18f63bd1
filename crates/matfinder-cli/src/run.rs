//! Full-run orchestration: load seeds, scrape sequentially, snapshot,
//! persist, report.

use matfinder_core::types::GymEnrichmentResult;
use matfinder_core::AppConfig;
use matfinder_db::{PoolConfig, RetryPolicy};
use matfinder_scraper::{BrowserFetcher, HttpFetcher, Scraper};

use crate::snapshot;

/// Runs one enrichment pass end to end.
///
/// Gyms are processed sequentially — the fetchers' pacing gates are
/// per-instance and only meaningful under serialized access. Per-gym
/// failures are absorbed and reported; only setup failures (config, pool,
/// seed query) propagate as a non-zero exit. The browser is released on
/// every exit path.
///
/// # Errors
///
/// Returns an error if the database pool cannot be created or the seed
/// query fails.
pub async fn run(config: &AppConfig, limit: Option<i64>, dry_run: bool) -> anyhow::Result<()> {
    let pool =
        matfinder_db::connect_pool(&config.database_url, PoolConfig::from_app_config(config))
            .await?;
    let seeds = matfinder_db::load_gym_seeds(&pool, limit).await?;
    tracing::info!(target: "matfinder::run", gyms = seeds.len(), dry_run, "starting enrichment run");

    let http = HttpFetcher::new(
        config.fetch_timeout_secs,
        config.fetch_min_interval_ms,
        config.fetch_max_retries,
        config.fetch_backoff_base_ms,
    )?;
    let browser = config
        .browser_enabled
        .then(|| BrowserFetcher::new(config.browser_nav_timeout_secs, config.browser_min_interval_ms));
    // Kept outside the scraper so the process can be shut down on every
    // exit path below.
    let browser_handle = browser.clone();
    let scraper = Scraper::new(http, browser);

    let outcome = scrape_all(config, &scraper, &seeds, &pool, dry_run).await;

    if let Some(b) = &browser_handle {
        b.close().await;
    }
    outcome
}

async fn scrape_all(
    config: &AppConfig,
    scraper: &Scraper<HttpFetcher, BrowserFetcher>,
    seeds: &[matfinder_core::GymSeed],
    pool: &sqlx::PgPool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut snapshot = match snapshot::load(&config.snapshot_path) {
        Ok(previous) => previous,
        Err(err) => {
            tracing::warn!(target: "matfinder::run", error = %err, "could not load previous snapshot — starting empty");
            Vec::new()
        }
    };

    let mut results: Vec<GymEnrichmentResult> = Vec::with_capacity(seeds.len());
    let mut scrape_failures = 0usize;

    for (index, gym) in seeds.iter().enumerate() {
        tracing::info!(
            target: "matfinder::run",
            gym_id = gym.id,
            gym = %gym.name,
            progress = %format!("{}/{}", index + 1, seeds.len()),
            "scraping gym"
        );

        let outcome = scraper.scrape_contacts(gym).await;
        if outcome.failed {
            scrape_failures += 1;
            tracing::warn!(
                target: "matfinder::run",
                gym_id = gym.id,
                reason = outcome.failure_reason.as_deref().unwrap_or("unknown"),
                "gym scrape failed"
            );
        }

        // Snapshot after every gym so a crashed run resumes from here.
        snapshot = snapshot::merge(snapshot, vec![outcome.data.clone()]);
        if let Err(err) = snapshot::write(&config.snapshot_path, &snapshot) {
            tracing::error!(target: "matfinder::run", gym_id = gym.id, error = %err, "snapshot write failed — continuing");
        }

        results.push(outcome.data);
    }

    tracing::info!(
        target: "matfinder::run",
        scraped = results.len(),
        failed = scrape_failures,
        "scraping pass complete"
    );

    if dry_run {
        tracing::info!(target: "matfinder::run", "dry run — skipping persistence");
        return Ok(());
    }

    let summary = matfinder_db::persist_enrichments(
        pool,
        &results,
        RetryPolicy {
            max_attempts: config.persist_max_attempts,
            backoff_ms: config.persist_backoff_ms,
        },
    )
    .await;
    tracing::info!(target: "matfinder::run", %summary, "persistence complete");

    Ok(())
}
