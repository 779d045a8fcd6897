//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Koedex database.

/// SQL schema for the database
///
/// The `tags`, `voice_tags`, and `favorites` tables are reserved extension
/// points carried in the schema; nothing in the archiver reads or writes them.
pub const SCHEMA_SQL: &str = r#"
-- Ingested voice posts
CREATE TABLE IF NOT EXISTS voices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    posted_at TEXT NOT NULL,
    duration_seconds INTEGER,
    downloaded_at TEXT NOT NULL,
    file_path TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_voices_external_id ON voices(external_id);
CREATE INDEX IF NOT EXISTS idx_voices_downloaded_at ON voices(downloaded_at);

-- Reserved extension point: tagging
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS voice_tags (
    voice_id INTEGER NOT NULL REFERENCES voices(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (voice_id, tag_id)
);

-- Reserved extension point: favorites
CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    voice_id INTEGER NOT NULL REFERENCES voices(id)
);
"#;

/// Initializes the database schema
///
/// Idempotent: safe to call on every startup.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Initialize twice
        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        // Should succeed the second time too
        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let tables = vec!["voices", "tags", "voice_tags", "favorites"];

        for table in tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_external_id_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let insert = "INSERT INTO voices (external_id, title, author, posted_at, duration_seconds, downloaded_at, file_path)
                      VALUES ('1', 't', 'a', '2024-01-01T00:00:00Z', 10, '2024-01-01T00:00:00Z', '/tmp/1.mp3')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
