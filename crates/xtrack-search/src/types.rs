//! twitterapi.io response types for `GET /twitter/tweet/advanced_search`.
//!
//! Every tweet field is optional: the provider omits fields freely and sends
//! `null` for counts it does not have (notably `viewCount` on older tweets).
//! Tweet ids normally arrive as strings but numeric ids are accepted too.

use serde::{Deserialize, Deserializer};

/// Top-level advanced-search response.
#[derive(Debug, Default, Deserialize)]
pub struct AdvancedSearchResponse {
    #[serde(default)]
    pub tweets: Vec<RawPost>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A single search result as the provider returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// e.g. `"Tue Dec 10 07:00:30 +0000 2024"`.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub retweet_count: Option<i64>,
    #[serde(default)]
    pub reply_count: Option<i64>,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub author: Option<RawAuthor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthor {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub followers: Option<i64>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
