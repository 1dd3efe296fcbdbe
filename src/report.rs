use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::relevance::Relevance;

pub const TOO_SHORT_MARKER: &str = "Text too short to summarize";
pub const SUMMARY_UNAVAILABLE_MARKER: &str = "Summary unavailable";

/// Outcome of one summarization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Summary {
    #[serde(rename = "ok")]
    Text(String),
    TooShort,
    Unavailable,
}

impl Summary {
    pub fn as_str(&self) -> &str {
        match self {
            Summary::Text(text) => text,
            Summary::TooShort => TOO_SHORT_MARKER,
            Summary::Unavailable => SUMMARY_UNAVAILABLE_MARKER,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Summary::Text(_))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub author: String,
    pub score: i64,
    pub body: String,
    pub summary: Summary,
    pub relevance: Relevance,
}

/// The assembled report for one analyzed thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub url: String,
    pub submission_id: String,
    pub subreddit: String,
    pub title: String,
    pub post_text: String,
    pub score: i64,
    pub author: String,
    pub permalink: String,
    pub created_at: Option<DateTime<Utc>>,
    pub post_summary: Summary,
    pub summary_model: String,
    pub relevance_model: String,
    pub analyzed_at: DateTime<Utc>,
    pub comments: Vec<CommentRecord>,
}

impl ThreadRecord {
    pub fn relevant_count(&self) -> usize {
        self.comments
            .iter()
            .filter(|c| c.relevance.verdict == crate::relevance::Verdict::Yes)
            .count()
    }
}
