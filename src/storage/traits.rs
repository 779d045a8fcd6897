//! Storage traits and error types
//!
//! This module defines the trait interface for the ingestion store and
//! associated error types.

use crate::storage::{CorpusSummary, NewVoice, VoiceRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Duplicate external id: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the ingestion store
///
/// The page walker owns the store exclusively for the duration of a run; no
/// concurrent writers exist, so the only transactional discipline required is
/// the per-page commit boundary exposed here.
pub trait VoiceStore {
    // ===== Ingestion =====

    /// Checks whether a voice with this external id is already stored
    fn exists(&self, external_id: &str) -> StorageResult<bool>;

    /// Inserts a new voice record and returns its surrogate id
    ///
    /// Returns `StorageError::Conflict` if the external id is already
    /// present. Callers treat a conflict as a skip, never a crash: the
    /// existence check should prevent it, but a concurrent historical run or
    /// a re-walk may race the check.
    fn insert(&mut self, voice: &NewVoice) -> StorageResult<i64>;

    /// Opens the transaction covering one listing page's inserts
    fn begin_page(&mut self) -> StorageResult<()>;

    /// Durably commits everything inserted since `begin_page`
    ///
    /// A crash after this call never loses the committed page; a crash before
    /// it loses at most the one in-flight page.
    fn commit_page(&mut self) -> StorageResult<()>;

    // ===== Reads (browsing surface and stats) =====

    /// Fetches one page of voices, newest first by download time
    ///
    /// # Arguments
    ///
    /// * `search` - Optional substring filter over title and author
    /// * `page` - 1-based page number
    /// * `per_page` - Records per page
    fn list_voices(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> StorageResult<Vec<VoiceRecord>>;

    /// Counts voices matching the optional search filter
    fn count_voices(&self, search: Option<&str>) -> StorageResult<u64>;

    /// Fetches a voice by external id
    fn get_by_external_id(&self, external_id: &str) -> StorageResult<Option<VoiceRecord>>;

    /// Computes the corpus summary (count, total duration, bytes on disk)
    ///
    /// File sizes are read from the filesystem at call time; records whose
    /// audio file has gone missing contribute zero bytes.
    fn summary(&self) -> StorageResult<CorpusSummary>;
}
