//! Storage module for persisting ingested voices
//!
//! This module handles all database operations for the archiver, including:
//! - SQLite database initialization and schema management
//! - Existence checks and inserts keyed by external id
//! - Per-page transaction boundaries for crash-safe ingestion
//! - Paginated, searchable reads for the browsing surface

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, VoiceStore};

use crate::KoedexError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(KoedexError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStore, KoedexError> {
    SqliteStore::new(path)
}

/// A voice record as stored in the database
#[derive(Debug, Clone)]
pub struct VoiceRecord {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub posted_at: DateTime<Utc>,
    pub duration_seconds: Option<u32>,
    pub downloaded_at: DateTime<Utc>,
    pub file_path: String,
}

/// A candidate voice record ready for insertion
#[derive(Debug, Clone)]
pub struct NewVoice {
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub posted_at: DateTime<Utc>,
    pub duration_seconds: Option<u32>,
    pub downloaded_at: DateTime<Utc>,
    pub file_path: String,
}

/// Corpus-wide summary shown by the browsing surface and `stats`
#[derive(Debug, Clone, Default)]
pub struct CorpusSummary {
    /// Total number of stored voices
    pub voice_count: u64,
    /// Sum of all known durations, in seconds
    pub total_duration_seconds: u64,
    /// Total size of audio files present on disk, in bytes
    pub total_audio_bytes: u64,
}
