use thiserror::Error;
use uuid::Uuid;
use xtrack_core::MAX_SCRAPE_DAYS;
use xtrack_db::DbError;
use xtrack_search::SearchError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("campaign {0} has no keywords")]
    NoKeywords(Uuid),

    #[error("days must be between 1 and {MAX_SCRAPE_DAYS}, got {0}")]
    InvalidDays(i32),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Db(#[from] DbError),
}
