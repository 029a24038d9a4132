use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One job listing as scraped from a search-results page.
///
/// `published_date` keeps the raw source text for display/debugging;
/// `normalized_date` is the absolute instant derived from it, or `None`
/// when the text could not be interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub title: String,
    pub link: String,
    pub payment_type: String,
    pub budget: String,
    pub project_length: String,
    pub short_bio: String,
    pub skills: Vec<String>,
    pub published_date: String,
    pub normalized_date: Option<DateTime<Utc>>,
    pub search_url: String,
}
