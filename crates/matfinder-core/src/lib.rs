//! Shared domain types and configuration for the matfinder enrichment
//! pipeline.

use thiserror::Error;

mod app_config;
mod config;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    AddressParts, ContactDetails, FetchStrategy, GymEnrichmentResult, GymSeed, KeywordDetection,
    PageFetchResult, ScrapeOutcome,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
