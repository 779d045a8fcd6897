//! HTTP fetcher
//!
//! This module handles all HTTP requests for the archiver:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Fetching HTML documents (listing and detail pages)
//! - Fetching binary audio payloads
//!
//! All requests carry bounded timeouts; nothing here suspends indefinitely.
//! Error classification (timeout vs. connection vs. bad status) happens at
//! this layer so the walker can log and count failures uniformly.

use crate::config::Config;
use crate::{KoedexError, Result};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The loaded configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.source.user_agent.clone())
        .timeout(Duration::from_secs(config.scrape.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the response body as text
///
/// Non-2xx statuses are errors: the caller decides whether the failure is
/// fatal (listing page 1), page-level, or item-level.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(KoedexError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

/// Fetches a URL and returns the raw response bytes (audio payloads)
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(KoedexError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|e| classify_error(url, e))?;
    Ok(bytes.to_vec())
}

/// Classifies a reqwest error into the crate's error taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> KoedexError {
    if e.is_timeout() {
        KoedexError::Timeout {
            url: url.to_string(),
        }
    } else {
        KoedexError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}
