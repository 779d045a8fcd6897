//! Scrape module for harvesting voice posts
//!
//! This module contains the ingestion pipeline:
//! - HTTP fetching with bounded timeouts
//! - Listing-page parsing (detail links, pagination discovery)
//! - Detail-page extraction with field-level degradation
//! - The sequential page walker with per-page commits

mod detail;
mod fetcher;
mod fields;
mod listing;
mod walker;

pub use detail::{extract_voice, VoiceDetail, MISSING_AUTHOR, MISSING_TITLE};
pub use fetcher::{build_http_client, fetch_bytes, fetch_html};
pub use fields::{parse_duration, parse_posted_at, parse_posted_at_with_now};
pub use listing::{discover_last_page, extract_detail_links, extract_external_id};
pub use walker::{ItemOutcome, PageWalker, Stage, WalkSummary};

use crate::config::Config;
use crate::storage::open_storage;
use crate::Result;
use std::path::Path;

/// Runs one complete ingestion pass
///
/// This is the main entry point for scraping. It will:
/// 1. Ensure the downloads directory exists
/// 2. Open the store, initializing the schema if absent
/// 3. Build the HTTP client
/// 4. Walk the listing pages, ingesting new voices
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `max_pages` - Optional cap on the number of listing pages to walk
///
/// # Returns
///
/// * `Ok(WalkSummary)` - The walk finished; see the summary for counts
/// * `Err(KoedexError)` - Listing page 1 was unavailable or storage failed
pub async fn scrape(config: &Config, max_pages: Option<u32>) -> Result<WalkSummary> {
    // Startup concerns are explicit here, never module-load side effects
    std::fs::create_dir_all(&config.storage.downloads_dir)?;
    let mut store = open_storage(Path::new(&config.storage.database_path))?;

    let client = build_http_client(config)?;

    let mut walker = PageWalker::new(&client, config, &mut store);
    walker.run(max_pages).await
}
