//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the VoiceStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, VoiceStore};
use crate::storage::{CorpusSummary, NewVoice, VoiceRecord};
use crate::KoedexError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
    in_page_tx: bool,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// Opens (or creates) the database file and initializes the schema.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(KoedexError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, KoedexError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            in_page_tx: false,
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, KoedexError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            in_page_tx: false,
        })
    }
}

const VOICE_COLUMNS: &str =
    "id, external_id, title, author, posted_at, duration_seconds, downloaded_at, file_path";

/// Maps one `voices` row to a VoiceRecord
fn row_to_voice(row: &rusqlite::Row<'_>) -> rusqlite::Result<VoiceRecord> {
    Ok(VoiceRecord {
        id: row.get(0)?,
        external_id: row.get(1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        posted_at: parse_timestamp(row, 4)?,
        duration_seconds: row.get(5)?,
        downloaded_at: parse_timestamp(row, 6)?,
        file_path: row.get(7)?,
    })
}

/// Parses an RFC 3339 timestamp column
fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Returns true if the error is a UNIQUE constraint violation
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl VoiceStore for SqliteStore {
    fn exists(&self, external_id: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM voices WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&mut self, voice: &NewVoice) -> StorageResult<i64> {
        let result = self.conn.execute(
            "INSERT INTO voices (external_id, title, author, posted_at, duration_seconds, downloaded_at, file_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                voice.external_id,
                voice.title,
                voice.author,
                voice.posted_at.to_rfc3339(),
                voice.duration_seconds,
                voice.downloaded_at.to_rfc3339(),
                voice.file_path,
            ],
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Conflict(voice.external_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn begin_page(&mut self) -> StorageResult<()> {
        if !self.in_page_tx {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            self.in_page_tx = true;
        }
        Ok(())
    }

    fn commit_page(&mut self) -> StorageResult<()> {
        if self.in_page_tx {
            self.conn.execute_batch("COMMIT")?;
            self.in_page_tx = false;
        }
        Ok(())
    }

    fn list_voices(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> StorageResult<Vec<VoiceRecord>> {
        let page = page.max(1);
        let offset = (page as i64 - 1) * per_page as i64;

        let voices = match search {
            Some(term) if !term.is_empty() => {
                let pattern = format!("%{}%", term);
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM voices
                     WHERE title LIKE ?1 OR author LIKE ?1
                     ORDER BY downloaded_at DESC, id DESC
                     LIMIT ?2 OFFSET ?3",
                    VOICE_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![pattern, per_page, offset], row_to_voice)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            _ => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM voices
                     ORDER BY downloaded_at DESC, id DESC
                     LIMIT ?1 OFFSET ?2",
                    VOICE_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![per_page, offset], row_to_voice)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(voices)
    }

    fn count_voices(&self, search: Option<&str>) -> StorageResult<u64> {
        let count: i64 = match search {
            Some(term) if !term.is_empty() => {
                let pattern = format!("%{}%", term);
                self.conn.query_row(
                    "SELECT COUNT(*) FROM voices WHERE title LIKE ?1 OR author LIKE ?1",
                    params![pattern],
                    |row| row.get(0),
                )?
            }
            _ => self
                .conn
                .query_row("SELECT COUNT(*) FROM voices", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn get_by_external_id(&self, external_id: &str) -> StorageResult<Option<VoiceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM voices WHERE external_id = ?1",
            VOICE_COLUMNS
        ))?;
        let voice = stmt
            .query_row(params![external_id], row_to_voice)
            .optional()?;
        Ok(voice)
    }

    fn summary(&self) -> StorageResult<CorpusSummary> {
        let (voice_count, total_duration_seconds): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_seconds), 0) FROM voices",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        // File sizes come from the filesystem at call time; missing files
        // contribute zero bytes rather than failing the summary.
        let mut stmt = self.conn.prepare("SELECT file_path FROM voices")?;
        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let total_audio_bytes = paths
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        Ok(CorpusSummary {
            voice_count: voice_count as u64,
            total_duration_seconds: total_duration_seconds as u64,
            total_audio_bytes,
        })
    }
}
