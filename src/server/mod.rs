//! Browsing read surface
//!
//! A small axum server over the collected corpus: a paginated, searchable
//! listing page and a file-serving endpoint for stored audio. This surface is
//! read-only; all ingestion happens in the scrape pipeline.

mod render;

pub use render::{format_bytes, format_total_duration};

use crate::config::Config;
use crate::storage::{open_storage, CorpusSummary, SqliteStore, VoiceStore};
use crate::{KoedexError, Result};
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use render::VoiceRow;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state for request handlers
///
/// Handlers open a fresh store connection per request; the server never
/// writes, so there is no contention with a concurrently running scrape
/// beyond SQLite's own locking.
pub struct AppState {
    pub database_path: PathBuf,
    pub downloads_dir: PathBuf,
    pub per_page: u32,
}

impl AppState {
    fn open_store(&self) -> Result<SqliteStore> {
        open_storage(&self.database_path)
    }
}

/// Query parameters for the listing page
#[derive(Debug, Deserialize)]
struct ListParams {
    /// Substring search over title and author
    q: Option<String>,
    /// 1-based page number
    page: Option<u32>,
}

/// Starts the browsing server and blocks until it exits
///
/// Initializes the database schema if the file does not exist yet, so the
/// browsing page works before the first scrape has run.
pub async fn run_server(config: &Config) -> Result<()> {
    // Bootstrap storage up front; handlers assume a valid schema
    open_storage(std::path::Path::new(&config.storage.database_path))?;

    let state = Arc::new(AppState {
        database_path: PathBuf::from(&config.storage.database_path),
        downloads_dir: PathBuf::from(&config.storage.downloads_dir),
        per_page: config.server.per_page,
    });

    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Browsing page listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| KoedexError::Server(e.to_string()))
}

/// Builds the router over shared state
fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/downloads/:filename", get(download_handler))
        .with_state(state)
}

/// GET / - paginated, searchable listing of stored voices
async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let search = params.q.as_deref().filter(|q| !q.is_empty());
    let page = params.page.unwrap_or(1).max(1);

    let store = match state.open_store() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let result = (|| -> Result<(Vec<VoiceRow>, CorpusSummary, u32)> {
        let voices = store.list_voices(search, page, state.per_page)?;
        let matching = store.count_voices(search)?;
        let summary = store.summary()?;

        let total_pages = ((matching + state.per_page as u64 - 1) / state.per_page as u64) as u32;

        let rows = voices
            .into_iter()
            .map(|record| {
                let audio_available = std::path::Path::new(&record.file_path).is_file();
                VoiceRow {
                    record,
                    audio_available,
                }
            })
            .collect();

        Ok((rows, summary, total_pages.max(1)))
    })();

    match result {
        Ok((rows, summary, total_pages)) => Html(render::index_page(
            &rows,
            &summary,
            search,
            page,
            total_pages,
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Listing query failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /downloads/:filename - streams a stored audio file
async fn download_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Response {
    // Names are flat external-id filenames; anything path-like is rejected
    if !is_safe_filename(&filename) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state.downloads_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Accepts only flat filenames like "12345.mp3"
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.ends_with(".mp3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filenames_accepted() {
        assert!(is_safe_filename("12345.mp3"));
        assert!(is_safe_filename("0.mp3"));
    }

    #[test]
    fn test_traversal_names_rejected() {
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("a/b.mp3"));
        assert!(!is_safe_filename("a\\b.mp3"));
        assert!(!is_safe_filename("..%2fsecret.mp3"));
        assert!(!is_safe_filename(""));
    }

    #[test]
    fn test_non_audio_names_rejected() {
        assert!(!is_safe_filename("voices.db"));
        assert!(!is_safe_filename("12345.wav"));
    }
}
