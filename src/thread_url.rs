//! Thread URL handling: submission id extraction and the form's URL pattern.

use regex::Regex;
use std::sync::OnceLock;
use url::{ParseError, Url};

use crate::error::AppError;

const THREAD_URL_PATTERN: &str =
    r"^https?://(www\.|old\.|new\.|np\.)?reddit\.com/r/[A-Za-z0-9_]+/comments/[A-Za-z0-9]+";

fn thread_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(THREAD_URL_PATTERN).expect("thread URL pattern is valid"))
}

/// Returns true when `url` looks like a link to a Reddit comment thread.
pub fn is_thread_url(url: &str) -> bool {
    thread_url_regex().is_match(url.trim())
}

/// Extracts the submission id: the path segment right after `comments`.
///
/// A `comments` segment directly after `r` is a subreddit name and is skipped.
/// Input without a scheme is read as `https://`.
pub fn parse_thread_id(url: &str) -> Result<String, AppError> {
    let trimmed = url.trim();
    let parsed = match Url::parse(trimmed) {
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", trimmed)),
        other => other,
    }
    .map_err(|e| AppError::InvalidUrl(format!("{}: {}", url, e)))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    let position = segments
        .iter()
        .enumerate()
        .position(|(i, segment)| *segment == "comments" && (i == 0 || segments[i - 1] != "r"))
        .ok_or_else(|| AppError::InvalidUrl(format!("no 'comments' segment in {}", url)))?;

    match segments.get(position + 1) {
        Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok((*id).to_string())
        }
        Some(id) if !id.is_empty() => Err(AppError::InvalidUrl(format!(
            "malformed submission id '{}' in {}",
            id, url
        ))),
        _ => Err(AppError::InvalidUrl(format!(
            "missing submission id after 'comments' in {}",
            url
        ))),
    }
}
