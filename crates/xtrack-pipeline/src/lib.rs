//! Scrape orchestration: campaign lookup, provider pagination, filtering,
//! deduplication, idempotent storage, and scrape-run bookkeeping.

pub mod error;
pub mod scrape;

pub use error::PipelineError;
pub use scrape::{run_scrape, search_window, ScrapeOptions, ScrapeOutcome, SearchWindow};
