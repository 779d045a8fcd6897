//! Integration tests for the Koedex archiver
//!
//! These tests run the full ingestion pipeline against wiremock HTTP servers
//! and temporary databases.

mod scrape_tests;
