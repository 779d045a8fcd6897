//! Detail-page extraction
//!
//! Given a fetched detail-page document, locates the title, author,
//! posted-time text, and duration text by structural selector. Every lookup
//! is independently tolerant: a missing field degrades to a placeholder or
//! absent value and never aborts extraction of the others.

use crate::scrape::fields::{parse_duration, parse_posted_at_with_now};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

/// Placeholder title when the markup lacks one
pub const MISSING_TITLE: &str = "(no title)";

/// Placeholder author when the markup lacks one
pub const MISSING_AUTHOR: &str = "(unknown)";

/// Metadata extracted from one detail page
#[derive(Debug, Clone)]
pub struct VoiceDetail {
    pub title: String,
    pub author: String,
    pub posted_at: DateTime<Utc>,
    pub duration_seconds: Option<u32>,
}

/// Extracts voice metadata from a detail-page document
///
/// # Arguments
///
/// * `html` - The detail page content
/// * `now` - Wall-clock time used to resolve the relative posted-at text
///
/// # Returns
///
/// A fully populated candidate, with placeholders where fields are absent:
/// missing title/author become placeholder strings, missing posted-at text
/// resolves to `now`, and missing duration text yields None.
pub fn extract_voice(html: &str, now: DateTime<Utc>) -> VoiceDetail {
    let document = Html::parse_document(html);

    let title = select_text(&document, "#content_body > h2")
        .unwrap_or_else(|| MISSING_TITLE.to_string());
    let author =
        select_text(&document, ".user_name").unwrap_or_else(|| MISSING_AUTHOR.to_string());

    let posted_at = match select_text(&document, ".meta.detail .meta_item .metaIcon_up") {
        Some(text) => parse_posted_at_with_now(&text, now),
        None => now,
    };

    let duration_seconds = select_text(&document, ".audioTime")
        .as_deref()
        .and_then(parse_duration);

    VoiceDetail {
        title,
        author,
        posted_at,
        duration_seconds,
    }
}

/// Returns the trimmed text of the first element matching `selector`
///
/// None when the selector matches nothing or the text is empty.
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
