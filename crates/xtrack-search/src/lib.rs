pub mod client;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod provider;
mod rate_limit;
pub mod types;

pub use client::TwitterApiClient;
pub use error::SearchError;
pub use normalize::{normalize_post, parse_posted_at};
pub use pagination::{fetch_all_pages, MAX_PAGES_PER_QUERY};
pub use provider::{build_query, SearchPage, SearchProvider, SearchQuery};
pub use types::{AdvancedSearchResponse, RawAuthor, RawPost};
