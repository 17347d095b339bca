use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by search provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("search provider returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("pagination limit reached for query \"{query}\": exceeded {max_pages} pages")]
    PaginationLimit { query: String, max_pages: usize },

    #[error("invalid search base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("TWITTERAPI_KEY is not set")]
    MissingApiKey,
}
