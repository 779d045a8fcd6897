//! Listing-page parsing
//!
//! This module extracts the two things a listing page carries:
//! - detail-page links, deduplicated within the page in document order
//! - pagination anchors, from which the last page index is discovered

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts detail-page links from a listing document
///
/// Links are taken from the post list (`div.content > a` anchors pointing at
/// `detail.php`), resolved against the base URL, and deduplicated keeping the
/// first occurrence in document order.
pub fn extract_detail_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(selector) = Selector::parse(r#"div.content > a[href*="detail.php"]"#) {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(absolute) = base_url.join(href) else {
                continue;
            };
            let absolute = absolute.to_string();
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    links
}

/// Discovers the last listing page from pagination anchors
///
/// Scans anchors referencing the listing script for their `p` query value and
/// returns the maximum page index referenced, defaulting to 1 when no
/// pagination anchors exist. The result is the highest index seen, not the
/// anchor count: a pager showing {1,2,3,5} means 5 pages.
pub fn discover_last_page(html: &str, base_url: &Url) -> u32 {
    let document = Html::parse_document(html);

    let mut last_page = 1;

    if let Ok(selector) = Selector::parse(r#"a[href*="list.php"]"#) {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(absolute) = base_url.join(href) else {
                continue;
            };
            if let Some(page) = page_param(&absolute) {
                last_page = last_page.max(page);
            }
        }
    }

    last_page
}

/// Derives the external id from a detail-page URL
///
/// The id is the numeric `n` query parameter. Returns None when the
/// parameter is missing or non-numeric; such links are skipped by the walker.
pub fn extract_external_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let (_, value) = parsed.query_pairs().find(|(key, _)| key == "n")?;
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(value.into_owned())
}

/// Reads the `p` query parameter as a page number
fn page_param(url: &Url) -> Option<u32> {
    let (_, value) = url.query_pairs().find(|(key, _)| key == "p")?;
    value.parse().ok()
}
