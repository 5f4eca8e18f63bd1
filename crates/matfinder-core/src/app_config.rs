use std::path::PathBuf;

/// Runtime configuration for an enrichment run, loaded from environment
/// variables by [`crate::load_app_config`].
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    /// Intermediate snapshot file holding all enrichment results so far.
    pub snapshot_path: PathBuf,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub fetch_timeout_secs: u64,
    pub fetch_min_interval_ms: u64,
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_ms: u64,

    pub browser_enabled: bool,
    pub browser_nav_timeout_secs: u64,
    pub browser_min_interval_ms: u64,

    pub persist_max_attempts: u32,
    pub persist_backoff_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("snapshot_path", &self.snapshot_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_min_interval_ms", &self.fetch_min_interval_ms)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_backoff_base_ms", &self.fetch_backoff_base_ms)
            .field("browser_enabled", &self.browser_enabled)
            .field("browser_nav_timeout_secs", &self.browser_nav_timeout_secs)
            .field("browser_min_interval_ms", &self.browser_min_interval_ms)
            .field("persist_max_attempts", &self.persist_max_attempts)
            .field("persist_backoff_ms", &self.persist_backoff_ms)
            .finish()
    }
}
