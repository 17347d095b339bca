//! Cursor-driven multi-page fetch over any [`SearchProvider`].

use std::time::Duration;

use crate::error::SearchError;
use crate::provider::{SearchProvider, SearchQuery};
use crate::types::RawPost;

/// Page ceiling for a single query. Guards against providers that keep
/// handing out cursors forever.
pub const MAX_PAGES_PER_QUERY: usize = 100;

/// Fetches pages for `query` until the provider reports no further page, the
/// next cursor is empty, or `max_items` raw items have been collected. The
/// result is truncated to `max_items`.
///
/// `inter_request_delay_ms` is slept between consecutive page requests (not
/// before the first).
///
/// Already-fetched items are discarded when any page fails.
///
/// # Errors
///
/// Propagates any error from [`SearchProvider::search_page`]. Returns
/// [`SearchError::PaginationLimit`] if more than [`MAX_PAGES_PER_QUERY`]
/// pages would be needed.
pub async fn fetch_all_pages<P>(
    provider: &P,
    query: &str,
    max_items: usize,
    inter_request_delay_ms: u64,
) -> Result<Vec<RawPost>, SearchError>
where
    P: SearchProvider + ?Sized,
{
    let mut items: Vec<RawPost> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0usize;

    while items.len() < max_items {
        page_count += 1;
        if page_count > MAX_PAGES_PER_QUERY {
            return Err(SearchError::PaginationLimit {
                query: query.to_owned(),
                max_pages: MAX_PAGES_PER_QUERY,
            });
        }

        if page_count > 1 && inter_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
        }

        let page = provider
            .search_page(&SearchQuery {
                query: query.to_owned(),
                cursor: cursor.clone(),
            })
            .await?;

        tracing::debug!(
            query,
            page = page_count,
            items = page.items.len(),
            has_next_page = page.has_next_page,
            "fetched search page"
        );

        let next = page.continuation().map(str::to_owned);
        items.extend(page.items);

        match next {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    items.truncate(max_items);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::provider::SearchPage;

    /// Serves scripted pages in order and records every query it receives.
    struct ScriptedProvider {
        pages: Mutex<VecDeque<SearchPage>>,
        seen: Mutex<Vec<SearchQuery>>,
        endless: bool,
    }

    impl ScriptedProvider {
        fn new(pages: Vec<SearchPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                seen: Mutex::new(Vec::new()),
                endless: false,
            }
        }

        fn endless() -> Self {
            Self {
                endless: true,
                ..Self::new(Vec::new())
            }
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
            self.seen.lock().unwrap().push(query.clone());
            if self.endless {
                return Ok(page(&["x"], Some("again")));
            }
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> SearchPage {
        SearchPage {
            items: ids
                .iter()
                .map(|id| RawPost {
                    id: Some((*id).to_owned()),
                    ..RawPost::default()
                })
                .collect(),
            has_next_page: next.is_some(),
            next_cursor: next.map(str::to_owned),
        }
    }

    fn ids(items: &[RawPost]) -> Vec<&str> {
        items.iter().filter_map(|p| p.id.as_deref()).collect()
    }

    #[tokio::test]
    async fn follows_cursor_until_exhausted() {
        let provider = ScriptedProvider::new(vec![
            page(&["1", "2"], Some("c1")),
            page(&["3"], Some("c2")),
            page(&["4"], None),
        ]);
        let items = fetch_all_pages(&provider, "q", 500, 0).await.unwrap();
        assert_eq!(ids(&items), vec!["1", "2", "3", "4"]);

        let cursors: Vec<Option<String>> = provider
            .seen
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.cursor.clone())
            .collect();
        assert_eq!(
            cursors,
            vec![None, Some("c1".to_owned()), Some("c2".to_owned())]
        );
    }

    #[tokio::test]
    async fn stops_at_item_cap_and_truncates() {
        let provider = ScriptedProvider::new(vec![
            page(&["1", "2", "3"], Some("c1")),
            page(&["4", "5", "6"], Some("c2")),
            page(&["7"], None),
        ]);
        let items = fetch_all_pages(&provider, "q", 5, 0).await.unwrap();
        assert_eq!(ids(&items), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(provider.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_cursor_ends_pagination() {
        let mut first = page(&["1"], Some(""));
        first.has_next_page = true;
        let provider = ScriptedProvider::new(vec![first, page(&["2"], None)]);
        let items = fetch_all_pages(&provider, "q", 500, 0).await.unwrap();
        assert_eq!(ids(&items), vec!["1"]);
    }

    #[tokio::test]
    async fn zero_cap_makes_no_requests() {
        let provider = ScriptedProvider::new(vec![page(&["1"], None)]);
        let items = fetch_all_pages(&provider, "q", 0, 0).await.unwrap();
        assert!(items.is_empty());
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cycling_cursor_hits_page_ceiling() {
        let provider = ScriptedProvider::endless();
        let err = fetch_all_pages(&provider, "q", usize::MAX, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::PaginationLimit {
                max_pages: MAX_PAGES_PER_QUERY,
                ..
            }
        ));
        assert_eq!(provider.seen.lock().unwrap().len(), MAX_PAGES_PER_QUERY);
    }
}
