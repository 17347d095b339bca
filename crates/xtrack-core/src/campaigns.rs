use std::collections::HashSet;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SCRAPE_DAYS: i32 = 7;
pub const MAX_SCRAPE_DAYS: i32 = 365;
pub const MAX_NAME_LEN: usize = 200;
pub const SLUG_SUFFIX_LEN: usize = 4;

const SLUG_SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("name must be at most {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("at least one keyword is required")]
    MissingKeywords,

    #[error("scrape_days must be between 1 and {MAX_SCRAPE_DAYS}, got {0}")]
    ScrapeDaysOutOfRange(i32),

    #[error("{field} must not be negative, got {value}")]
    NegativeEngagement { field: &'static str, value: i64 },

    #[error("min_engagement ({min}) must not exceed max_engagement ({max})")]
    EngagementRangeInverted { min: i64, max: i64 },
}

/// Campaign fields as submitted by a caller, before cleaning and validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignInput {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub scrape_days: Option<i32>,
    pub min_engagement: Option<i64>,
    pub max_engagement: Option<i64>,
}

/// A validated campaign ready to be stored. Built only through
/// [`CampaignInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
    pub name: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub scrape_days: i32,
    pub min_engagement: i64,
    pub max_engagement: Option<i64>,
}

impl CampaignInput {
    /// Trim and check the submitted fields.
    ///
    /// Keywords are trimmed, blanks dropped, and case-insensitive duplicates
    /// collapsed onto their first spelling. A blank description becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(self) -> Result<NewCampaign, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong);
        }

        let keywords = clean_keywords(&self.keywords);
        if keywords.is_empty() {
            return Err(ValidationError::MissingKeywords);
        }

        let scrape_days = self.scrape_days.unwrap_or(DEFAULT_SCRAPE_DAYS);
        if !(1..=MAX_SCRAPE_DAYS).contains(&scrape_days) {
            return Err(ValidationError::ScrapeDaysOutOfRange(scrape_days));
        }

        let min_engagement = self.min_engagement.unwrap_or(0);
        if min_engagement < 0 {
            return Err(ValidationError::NegativeEngagement {
                field: "min_engagement",
                value: min_engagement,
            });
        }
        if let Some(max) = self.max_engagement {
            if max < 0 {
                return Err(ValidationError::NegativeEngagement {
                    field: "max_engagement",
                    value: max,
                });
            }
            if min_engagement > max {
                return Err(ValidationError::EngagementRangeInverted {
                    min: min_engagement,
                    max,
                });
            }
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(NewCampaign {
            name,
            description,
            keywords,
            scrape_days,
            min_engagement,
            max_engagement: self.max_engagement,
        })
    }
}

fn clean_keywords(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Lowercase the name and collapse every run of characters outside `[a-z0-9]`
/// into a single `-`, with no leading or trailing separator.
#[must_use]
pub fn slug_base(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Build a campaign slug: [`slug_base`] followed by `-` and a random
/// four-character suffix. A name without any alphanumerics yields the suffix alone.
#[must_use]
pub fn generate_slug(name: &str) -> String {
    slug_with_suffix(name, &random_suffix(&mut rand::rng()))
}

fn slug_with_suffix(name: &str, suffix: &str) -> String {
    let base = slug_base(name);
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}

fn random_suffix<R: Rng>(rng: &mut R) -> String {
    (0..SLUG_SUFFIX_LEN)
        .map(|_| char::from(SLUG_SUFFIX_ALPHABET[rng.random_range(0..SLUG_SUFFIX_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
#[path = "campaigns_test.rs"]
mod tests;
