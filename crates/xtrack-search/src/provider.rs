//! The search-provider contract the scrape pipeline depends on.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SearchError;
use crate::types::RawPost;

/// One page request: the query string plus the cursor from the previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<RawPost>,
    pub has_next_page: bool,
    pub next_cursor: Option<String>,
}

impl SearchPage {
    /// Cursor for the following page, or `None` when pagination is exhausted.
    /// A page that claims more results but carries an empty cursor ends pagination.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        if !self.has_next_page {
            return None;
        }
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// A paginated post search. Implementations retry their own transient
/// failures; an `Err` from [`SearchProvider::search_page`] is final.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, SearchError>;
}

/// Build the advanced-search query for one keyword over an inclusive date window.
#[must_use]
pub fn build_query(keyword: &str, since: NaiveDate, until: NaiveDate) -> String {
    format!(
        "{keyword} since:{} until:{} lang:en",
        since.format("%Y-%m-%d"),
        until.format("%Y-%m-%d")
    )
}
