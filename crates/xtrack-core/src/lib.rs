pub mod app_config;
pub mod campaigns;
pub mod config;
pub mod metrics;
pub mod posts;

pub use app_config::{AppConfig, Environment};
pub use campaigns::{
    generate_slug, slug_base, CampaignInput, NewCampaign, ValidationError, DEFAULT_SCRAPE_DAYS,
    MAX_SCRAPE_DAYS,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use metrics::{compute_metrics, CampaignMetrics, EngagementCounts};
pub use posts::{dedupe_by_id, EngagementFilter, NormalizedPost};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
