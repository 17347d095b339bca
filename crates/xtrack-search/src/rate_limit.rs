//! Retry with exponential backoff and jitter for search requests.
//!
//! Transient failures (429, network errors, 5xx) are retried. Everything else
//! is returned on the first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::SearchError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors worth retrying after a backoff delay.
pub(crate) fn is_retriable(err: &SearchError) -> bool {
    match err {
        SearchError::RateLimited { .. } => true,
        SearchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SearchError::UnexpectedStatus { status, .. } => *status >= 500,
        SearchError::Deserialize { .. }
        | SearchError::PaginationLimit { .. }
        | SearchError::InvalidBaseUrl { .. }
        | SearchError::MissingApiKey => false,
    }
}

/// Delay before retry number `attempt` (1-based): `backoff_base_ms * 2^(attempt-1)`,
/// raised to the provider's `Retry-After` on 429, capped at 60 s.
fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32, err: &SearchError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let floor = match err {
        SearchError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    computed.max(floor).min(MAX_DELAY_MS)
}

/// Runs `operation`, retrying transient errors up to `max_retries` more times.
///
/// With `backoff_base_ms = 1_000` the waits are roughly 1 s, 2 s, 4 s (±25 %
/// jitter). The last error is returned once retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_delay_ms(backoff_base_ms, attempt, &err);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient search error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
