use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::EngagementCounts;

/// A search result converted into the shape the store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPost {
    /// Provider-assigned post identifier; the upsert key.
    pub id: String,
    /// Keyword whose query produced this post.
    pub matched_keyword: Option<String>,
    pub text: Option<String>,
    pub author_handle: Option<String>,
    pub author_name: Option<String>,
    pub author_followers: Option<i64>,
    pub posted_at: Option<DateTime<Utc>>,
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    pub views: i64,
    pub url: Option<String>,
}

impl NormalizedPost {
    /// Score used by the scrape-time filter: likes + retweets + replies.
    #[must_use]
    pub fn engagement_score(&self) -> i64 {
        self.likes
            .saturating_add(self.retweets)
            .saturating_add(self.replies)
    }
}

impl EngagementCounts for NormalizedPost {
    fn likes(&self) -> i64 {
        self.likes
    }

    fn retweets(&self) -> i64 {
        self.retweets
    }

    fn replies(&self) -> i64 {
        self.replies
    }

    fn views(&self) -> i64 {
        self.views
    }
}

/// Inclusive engagement bounds applied while scraping. A missing upper bound
/// admits any score at or above the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementFilter {
    pub min: i64,
    pub max: Option<i64>,
}

impl EngagementFilter {
    #[must_use]
    pub fn new(min: i64, max: Option<i64>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn accepts(&self, score: i64) -> bool {
        score >= self.min && self.max.is_none_or(|max| score <= max)
    }

    /// Keep only posts whose [`NormalizedPost::engagement_score`] lies within bounds.
    #[must_use]
    pub fn apply(&self, posts: Vec<NormalizedPost>) -> Vec<NormalizedPost> {
        posts
            .into_iter()
            .filter(|p| self.accepts(p.engagement_score()))
            .collect()
    }
}

/// Drop repeated ids, keeping the first occurrence and the input order.
#[must_use]
pub fn dedupe_by_id(posts: Vec<NormalizedPost>) -> Vec<NormalizedPost> {
    let mut seen = HashSet::with_capacity(posts.len());
    posts
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}
