//! HTTP client for the twitterapi.io advanced-search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use xtrack_core::AppConfig;

use crate::error::SearchError;
use crate::provider::{SearchPage, SearchProvider, SearchQuery};
use crate::rate_limit::retry_with_backoff;
use crate::types::AdvancedSearchResponse;

const SEARCH_PATH: &str = "twitter/tweet/advanced_search";
const API_KEY_HEADER: &str = "X-API-Key";
/// Longest slice of an error response body kept in [`SearchError::UnexpectedStatus`].
const ERROR_BODY_LIMIT: usize = 500;

/// twitterapi.io search client.
///
/// Requests `queryType=Latest` pages with cursor pagination. Transient errors
/// (429, network failures, 5xx) are retried with exponential backoff up to
/// `max_retries` additional attempts.
pub struct TwitterApiClient {
    pub(super) client: Client,
    pub(super) api_key: String,
    pub(super) search_url: Url,
    pub(super) max_retries: u32,
    pub(super) backoff_base_ms: u64,
}

impl std::fmt::Debug for TwitterApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterApiClient")
            .field("search_url", &self.search_url.as_str())
            .field("api_key", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl TwitterApiClient {
    /// Creates a client against `base_url` (e.g. `https://api.twitterapi.io`).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`SearchError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SearchError> {
        let search_url = Self::search_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            search_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::MissingApiKey`] if no `TWITTERAPI_KEY` is
    /// configured, otherwise any error from [`TwitterApiClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SearchError> {
        let api_key = config
            .twitterapi_key
            .as_deref()
            .ok_or(SearchError::MissingApiKey)?;
        Self::new(
            api_key,
            &config.search_base_url,
            config.search_request_timeout_secs,
            &config.search_user_agent,
            config.search_max_retries,
            config.search_retry_backoff_base_ms,
        )
    }

    /// Fetches one page of results for `query`, retrying transient errors.
    ///
    /// # Errors
    ///
    /// - [`SearchError::RateLimited`]: HTTP 429 after all retries.
    /// - [`SearchError::UnexpectedStatus`]: any other non-2xx status (5xx retried first).
    /// - [`SearchError::Http`]: network or TLS failure after all retries.
    /// - [`SearchError::Deserialize`]: body is not a valid search response (not retried).
    pub async fn fetch_page(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<AdvancedSearchResponse, SearchError> {
        let url = self.page_url(query, cursor);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url)
                    .header(API_KEY_HEADER, &self.api_key)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(0);
                    return Err(SearchError::RateLimited { retry_after_secs });
                }

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(SearchError::UnexpectedStatus {
                        status: status.as_u16(),
                        body: truncate_body(&body),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<AdvancedSearchResponse>(&body).map_err(|e| {
                    SearchError::Deserialize {
                        context: "advanced search page".to_owned(),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// Resolves the advanced-search endpoint under `base_url`, keeping any path prefix.
    fn search_url(base_url: &str) -> Result<Url, SearchError> {
        let joined = format!("{}/{SEARCH_PATH}", base_url.trim_end_matches('/'));
        let url = Url::parse(&joined).map_err(|e| SearchError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SearchError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", url.scheme()),
            });
        }
        Ok(url)
    }

    fn page_url(&self, query: &str, cursor: Option<&str>) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            pairs.append_pair("queryType", "Latest");
            if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
                pairs.append_pair("cursor", cursor);
            }
        }
        url
    }
}

#[async_trait]
impl SearchProvider for TwitterApiClient {
    async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        let response = self
            .fetch_page(&query.query, query.cursor.as_deref())
            .await?;
        Ok(SearchPage {
            items: response.tweets,
            has_next_page: response.has_next_page,
            next_cursor: response.next_cursor,
        })
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_owned(),
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
