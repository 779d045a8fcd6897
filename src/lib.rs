//! Koedex: a polite voice-post archiver
//!
//! This crate implements a strictly-serial scraper that harvests short audio
//! posts ("voices") from a paginated listing site, stores their metadata in
//! SQLite, downloads the audio payloads to disk, and serves a small searchable
//! browsing page over the collected corpus.

pub mod config;
pub mod scrape;
pub mod server;
pub mod storage;

use thiserror::Error;

/// Main error type for Koedex operations
#[derive(Debug, Error)]
pub enum KoedexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Listing page 1 unavailable ({url}): {message}")]
    ListingUnavailable { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Koedex operations
pub type Result<T> = std::result::Result<T, KoedexError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use scrape::{ItemOutcome, WalkSummary};
pub use storage::{NewVoice, SqliteStore, VoiceRecord, VoiceStore};
