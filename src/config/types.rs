use serde::Deserialize;
use url::Url;

/// Main configuration structure for Koedex
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub scrape: ScrapeConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Source site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the source site (e.g., "https://koe-koe.com/")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing path relative to the base URL; the page number is appended
    /// as the `p` query parameter
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Audio payload URL template; `{id}` is replaced by the external id
    #[serde(rename = "audio-url-template")]
    pub audio_url_template: String,

    /// User agent string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Scrape behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Politeness delay between consecutive items on a page (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory where downloaded audio files are written
    #[serde(rename = "downloads-dir")]
    pub downloads_dir: String,
}

/// Browsing read-surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// TCP port for the browsing page
    #[serde(default = "default_port")]
    pub port: u16,

    /// Records shown per listing page
    #[serde(rename = "per-page", default = "default_per_page")]
    pub per_page: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            per_page: default_per_page(),
        }
    }
}

fn default_user_agent() -> String {
    format!("koedex/{}", env!("CARGO_PKG_VERSION"))
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    5000
}

fn default_per_page() -> u32 {
    20
}

impl SourceConfig {
    /// Builds the absolute URL for listing page `page`
    ///
    /// The page number is appended as a `p` query parameter, preserving any
    /// query string already present in the configured listing path.
    pub fn listing_url(&self, page: u32) -> Result<Url, url::ParseError> {
        let base = Url::parse(&self.base_url)?;
        let mut url = base.join(&self.listing_path)?;
        url.query_pairs_mut().append_pair("p", &page.to_string());
        Ok(url)
    }

    /// Builds the audio payload URL for an external id
    pub fn audio_url(&self, external_id: &str) -> String {
        self.audio_url_template.replace("{id}", external_id)
    }
}
