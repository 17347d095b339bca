//! Conversion from provider search results to [`NormalizedPost`].

use chrono::{DateTime, Utc};
use xtrack_core::NormalizedPost;

use crate::types::RawPost;

/// Twitter's legacy timestamp layout, e.g. `Tue Dec 10 07:00:30 +0000 2024`.
const TWITTER_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Normalizes a raw search result found by `matched_keyword`.
///
/// Returns `None` when the item has no usable id. Missing counts become `0`
/// (negative counts are clamped to `0`); missing text, author fields, and
/// URL stay `None`.
#[must_use]
pub fn normalize_post(raw: RawPost, matched_keyword: &str) -> Option<NormalizedPost> {
    let id = raw.id.map(|id| id.trim().to_owned()).filter(|id| !id.is_empty())?;
    let author = raw.author.unwrap_or_default();

    Some(NormalizedPost {
        id,
        matched_keyword: Some(matched_keyword.to_owned()),
        text: raw.text,
        author_handle: non_empty(author.user_name),
        author_name: non_empty(author.name),
        author_followers: author.followers,
        posted_at: raw.created_at.as_deref().and_then(parse_posted_at),
        likes: count(raw.like_count),
        retweets: count(raw.retweet_count),
        replies: count(raw.reply_count),
        views: count(raw.view_count),
        url: non_empty(raw.url),
    })
}

/// Parses a provider timestamp, accepting RFC 3339 or Twitter's legacy layout.
#[must_use]
pub fn parse_posted_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, TWITTER_TIMESTAMP_FORMAT))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn count(value: Option<i64>) -> i64 {
    value.unwrap_or(0).max(0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
