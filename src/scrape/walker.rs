//! Page walker - the core ingestion state machine
//!
//! The walk proceeds DETERMINE_RANGE -> WALK_PAGE(1..=last) -> DONE, strictly
//! serially: one page at a time, one item at a time, with a politeness delay
//! between consecutive items. Failure handling follows a fixed taxonomy:
//! - page 1 unfetchable: fatal, the run cannot determine its range
//! - a later listing page unfetchable: logged, contributes zero, walk continues
//! - any single item failing: logged with URL and stage, walk continues
//!
//! The store is committed after each page so that a crash loses at most the
//! one in-flight page, never previously committed work.

use crate::config::Config;
use crate::scrape::detail::extract_voice;
use crate::scrape::fetcher::{fetch_bytes, fetch_html};
use crate::scrape::listing::{discover_last_page, extract_detail_links, extract_external_id};
use crate::storage::{NewVoice, StorageError, VoiceStore};
use crate::{KoedexError, Result};
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// The processing stage at which an item failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DedupCheck,
    DetailFetch,
    AudioFetch,
    AudioWrite,
    Insert,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::DedupCheck => "dedup check",
            Stage::DetailFetch => "detail fetch",
            Stage::AudioFetch => "audio fetch",
            Stage::AudioWrite => "audio write",
            Stage::Insert => "insert",
        };
        f.write_str(name)
    }
}

/// Structured outcome of processing one detail link
///
/// Counts and logs derive from these values rather than from control-flow
/// side effects.
#[derive(Debug)]
pub enum ItemOutcome {
    /// A new voice was downloaded and stored
    Ingested { external_id: String },
    /// The external id is already in the store; skipped
    AlreadyKnown { external_id: String },
    /// No external id could be derived from the link; skipped
    MissingId { url: String },
    /// The item failed at some stage; the walk continues
    Failed {
        url: String,
        stage: Stage,
        error: String,
    },
}

/// Aggregate result of one complete walk
#[derive(Debug, Default, Clone)]
pub struct WalkSummary {
    /// Last page index discovered from page 1's pagination anchors
    pub discovered_last_page: u32,
    /// Pages actually walked (after the optional cap)
    pub pages_walked: u32,
    /// Listing pages whose fetch failed (non-fatal)
    pub pages_failed: u32,
    /// Newly ingested voices
    pub new_voices: u64,
    /// Links skipped because the id was already stored
    pub already_known: u64,
    /// Links skipped because no id could be derived
    pub missing_ids: u64,
    /// Items that failed at some processing stage
    pub failed_items: u64,
}

impl WalkSummary {
    /// Folds one item outcome into the running counts
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Ingested { .. } => self.new_voices += 1,
            ItemOutcome::AlreadyKnown { .. } => self.already_known += 1,
            ItemOutcome::MissingId { .. } => self.missing_ids += 1,
            ItemOutcome::Failed { .. } => self.failed_items += 1,
        }
    }
}

/// Drives the sequential traversal of listing pages
///
/// Owns the store exclusively for the duration of the run.
pub struct PageWalker<'a, S: VoiceStore> {
    client: &'a Client,
    config: &'a Config,
    store: &'a mut S,
    downloads_dir: PathBuf,
}

impl<'a, S: VoiceStore> PageWalker<'a, S> {
    pub fn new(client: &'a Client, config: &'a Config, store: &'a mut S) -> Self {
        let downloads_dir = PathBuf::from(&config.storage.downloads_dir);
        Self {
            client,
            config,
            store,
            downloads_dir,
        }
    }

    /// Runs the complete walk
    ///
    /// # Arguments
    ///
    /// * `max_pages` - Optional cap clamping the walked range to
    ///   `min(discovered_last_page, cap)`
    ///
    /// # Returns
    ///
    /// * `Ok(WalkSummary)` - The walk finished (individual pages and items
    ///   may still have failed; see the summary counts)
    /// * `Err(KoedexError)` - Listing page 1 was unavailable, or the store
    ///   broke mid-run
    pub async fn run(&mut self, max_pages: Option<u32>) -> Result<WalkSummary> {
        let base_url = Url::parse(&self.config.source.base_url)?;

        // DETERMINE_RANGE: page 1 is mandatory; without it no range exists
        let first_url = self.config.source.listing_url(1)?;
        let first_html = fetch_html(self.client, first_url.as_str())
            .await
            .map_err(|e| KoedexError::ListingUnavailable {
                url: first_url.to_string(),
                message: e.to_string(),
            })?;

        let discovered = discover_last_page(&first_html, &base_url);
        let last_page = match max_pages {
            Some(cap) => discovered.min(cap),
            None => discovered,
        };
        tracing::info!(
            "Discovered {} listing page(s), walking {}",
            discovered,
            last_page
        );

        let mut summary = WalkSummary {
            discovered_last_page: discovered,
            ..Default::default()
        };

        for page in 1..=last_page {
            // Page 1 was already fetched while determining the range
            let html = if page == 1 {
                first_html.clone()
            } else {
                let url = self.config.source.listing_url(page)?;
                match fetch_html(self.client, url.as_str()).await {
                    Ok(html) => html,
                    Err(e) => {
                        // Non-fatal: one bad page must not abort the run
                        tracing::warn!("Skipping listing page {} ({}): {}", page, url, e);
                        summary.pages_failed += 1;
                        continue;
                    }
                }
            };

            let outcomes = self.walk_page(page, last_page, &html, &base_url).await?;
            for outcome in &outcomes {
                summary.record(outcome);
            }
            summary.pages_walked += 1;
        }

        tracing::info!(
            "Walk done: {} new, {} known, {} failed across {} page(s)",
            summary.new_voices,
            summary.already_known,
            summary.failed_items,
            summary.pages_walked
        );
        Ok(summary)
    }

    /// WALK_PAGE(n): processes every detail link on one listing page
    ///
    /// Opens the page transaction before the first item and commits it after
    /// the last, so the page's inserts become durable together.
    async fn walk_page(
        &mut self,
        page: u32,
        last_page: u32,
        html: &str,
        base_url: &Url,
    ) -> Result<Vec<ItemOutcome>> {
        let links = extract_detail_links(html, base_url);
        tracing::info!("Page {}/{}: {} detail link(s)", page, last_page, links.len());

        self.store.begin_page()?;

        let mut outcomes = Vec::with_capacity(links.len());
        for (index, link) in links.iter().enumerate() {
            if index > 0 && self.config.scrape.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.scrape.delay_ms)).await;
            }

            let outcome = self.process_item(link).await;
            match &outcome {
                ItemOutcome::Ingested { external_id } => {
                    tracing::info!("Ingested voice {}", external_id);
                }
                ItemOutcome::AlreadyKnown { external_id } => {
                    tracing::debug!("Voice {} already stored, skipping", external_id);
                }
                ItemOutcome::MissingId { url } => {
                    tracing::warn!("No external id in link {}, skipping", url);
                }
                ItemOutcome::Failed { url, stage, error } => {
                    tracing::warn!("Item {} failed during {}: {}", url, stage, error);
                }
            }
            outcomes.push(outcome);
        }

        self.store.commit_page()?;
        tracing::debug!("Page {} committed", page);

        Ok(outcomes)
    }

    /// Processes a single detail link through to a stored record
    ///
    /// Every failure is caught and reported as an outcome; nothing here
    /// aborts the page.
    async fn process_item(&mut self, link: &str) -> ItemOutcome {
        let Some(external_id) = extract_external_id(link) else {
            return ItemOutcome::MissingId {
                url: link.to_string(),
            };
        };

        match self.store.exists(&external_id) {
            Ok(true) => {
                return ItemOutcome::AlreadyKnown { external_id };
            }
            Ok(false) => {}
            Err(e) => {
                return ItemOutcome::Failed {
                    url: link.to_string(),
                    stage: Stage::DedupCheck,
                    error: e.to_string(),
                };
            }
        }

        let detail_html = match fetch_html(self.client, link).await {
            Ok(html) => html,
            Err(e) => {
                return ItemOutcome::Failed {
                    url: link.to_string(),
                    stage: Stage::DetailFetch,
                    error: e.to_string(),
                };
            }
        };

        let now = Utc::now();
        let detail = extract_voice(&detail_html, now);

        let audio_url = self.config.source.audio_url(&external_id);
        let audio_bytes = match fetch_bytes(self.client, &audio_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return ItemOutcome::Failed {
                    url: audio_url,
                    stage: Stage::AudioFetch,
                    error: e.to_string(),
                };
            }
        };

        // A crash between this write and the insert below leaves an orphaned
        // audio file; the next run re-processes the item and overwrites it.
        let file_path = self.downloads_dir.join(format!("{}.mp3", external_id));
        if let Err(e) = std::fs::write(&file_path, &audio_bytes) {
            return ItemOutcome::Failed {
                url: link.to_string(),
                stage: Stage::AudioWrite,
                error: e.to_string(),
            };
        }

        let voice = NewVoice {
            external_id: external_id.clone(),
            title: detail.title,
            author: detail.author,
            posted_at: detail.posted_at,
            duration_seconds: detail.duration_seconds,
            downloaded_at: now,
            file_path: file_path.to_string_lossy().into_owned(),
        };

        match self.store.insert(&voice) {
            Ok(_) => ItemOutcome::Ingested { external_id },
            // The existence check should prevent this, but a conflict is
            // still a skip, never a crash
            Err(StorageError::Conflict(_)) => ItemOutcome::AlreadyKnown { external_id },
            Err(e) => ItemOutcome::Failed {
                url: link.to_string(),
                stage: Stage::Insert,
                error: e.to_string(),
            },
        }
    }
}
