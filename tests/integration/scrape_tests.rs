//! End-to-end scrape tests
//!
//! Each test stands up a mock source site (listing pages, detail pages,
//! audio payloads), runs the scrape pipeline against it with a temporary
//! database and downloads directory, and asserts on the stored corpus.

use koedex::config::{Config, ScrapeConfig, ServerConfig, SourceConfig, StorageConfig};
use koedex::scrape::scrape;
use koedex::storage::{open_storage, NewVoice, VoiceStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    Config {
        source: SourceConfig {
            base_url: format!("{}/", server.uri()),
            listing_path: "list.php?g=1&g2=0".to_string(),
            audio_url_template: format!("{}/sound/{{id}}.mp3", server.uri()),
            user_agent: "koedex-test/0.0".to_string(),
        },
        scrape: ScrapeConfig {
            delay_ms: 0, // no politeness delay in tests
            request_timeout_secs: 5,
        },
        storage: StorageConfig {
            database_path: dir
                .path()
                .join("voices.db")
                .to_string_lossy()
                .into_owned(),
            downloads_dir: dir
                .path()
                .join("downloads")
                .to_string_lossy()
                .into_owned(),
        },
        server: ServerConfig::default(),
    }
}

/// Builds a listing page with detail links for `ids` and pagination anchors
/// referencing `pager_pages`
fn listing_html(ids: &[u32], pager_pages: &[u32]) -> String {
    let mut html = String::from("<html><body>");
    for id in ids {
        html.push_str(&format!(
            r#"<div class="content"><a href="detail.php?n={}">voice {}</a></div>"#,
            id, id
        ));
    }
    for p in pager_pages {
        html.push_str(&format!(r#"<a href="list.php?g=1&g2=0&p={}">{}</a>"#, p, p));
    }
    html.push_str("</body></html>");
    html
}

/// Builds a detail page with the standard field structure
fn detail_html(title: &str, author: &str, posted: &str, duration: &str) -> String {
    format!(
        r#"<html><body>
        <div id="content_body"><h2>{}</h2></div>
        <span class="user_name">{}</span>
        <div class="meta detail"><div class="meta_item"><span class="metaIcon_up">{}</span></div></div>
        <span class="audioTime">{}</span>
        </body></html>"#,
        title, author, posted, duration
    )
}

/// Mounts a listing page for page number `p`
async fn mount_listing(server: &MockServer, p: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/list.php"))
        .and(query_param("p", p.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a detail page and its audio payload for one id
async fn mount_voice(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path("/detail.php"))
        .and(query_param("n", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_html(
            &format!("voice {}", id),
            "tester",
            "@2時間前",
            "1分2秒",
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/sound/{}.mp3", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_payload(id)))
        .mount(server)
        .await;
}

fn audio_payload(id: u32) -> Vec<u8> {
    format!("mp3-payload-{}", id).into_bytes()
}

#[tokio::test]
async fn test_single_page_walk_ingests_all_items() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    mount_listing(&server, 1, listing_html(&[101, 102, 103], &[])).await;
    for id in [101, 102, 103] {
        mount_voice(&server, id).await;
    }

    let summary = scrape(&config, None).await.unwrap();

    assert_eq!(summary.discovered_last_page, 1);
    assert_eq!(summary.pages_walked, 1);
    assert_eq!(summary.new_voices, 3);
    assert_eq!(summary.failed_items, 0);

    let store = open_storage(std::path::Path::new(&config.storage.database_path)).unwrap();
    assert_eq!(store.count_voices(None).unwrap(), 3);

    let voice = store.get_by_external_id("102").unwrap().unwrap();
    assert_eq!(voice.title, "voice 102");
    assert_eq!(voice.author, "tester");
    assert_eq!(voice.duration_seconds, Some(62));

    // Audio payload written byte-for-byte under the external id
    let audio = std::fs::read(&voice.file_path).unwrap();
    assert_eq!(audio, audio_payload(102));
    assert!(voice.file_path.ends_with("102.mp3"));
}

#[tokio::test]
async fn test_multi_page_walk_follows_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    mount_listing(&server, 1, listing_html(&[1, 2], &[1, 2])).await;
    mount_listing(&server, 2, listing_html(&[3], &[1, 2])).await;
    for id in [1, 2, 3] {
        mount_voice(&server, id).await;
    }

    let summary = scrape(&config, None).await.unwrap();

    assert_eq!(summary.discovered_last_page, 2);
    assert_eq!(summary.pages_walked, 2);
    assert_eq!(summary.new_voices, 3);
}

#[tokio::test]
async fn test_page_range_uses_maximum_referenced_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    // Pager references {1,2,3,5}: range must be 5, not the anchor count
    mount_listing(&server, 1, listing_html(&[1], &[1, 2, 3, 5])).await;
    for p in 2..=5 {
        mount_listing(&server, p, listing_html(&[], &[])).await;
    }
    mount_voice(&server, 1).await;

    let summary = scrape(&config, None).await.unwrap();

    assert_eq!(summary.discovered_last_page, 5);
    assert_eq!(summary.pages_walked, 5);
    assert_eq!(summary.new_voices, 1);
}

#[tokio::test]
async fn test_cap_clamps_walked_range() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    // Ten discovered pages, cap of two: only pages 1 and 2 are fetched.
    // Pages 3..10 have no mock, so touching them would fail the summary.
    mount_listing(&server, 1, listing_html(&[1], &(1..=10).collect::<Vec<_>>())).await;
    mount_listing(&server, 2, listing_html(&[2], &[])).await;
    for id in [1, 2] {
        mount_voice(&server, id).await;
    }

    let summary = scrape(&config, Some(2)).await.unwrap();

    assert_eq!(summary.discovered_last_page, 10);
    assert_eq!(summary.pages_walked, 2);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.new_voices, 2);
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    mount_listing(&server, 1, listing_html(&[42], &[])).await;

    Mock::given(method("GET"))
        .and(path("/detail.php"))
        .and(query_param("n", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_html(
            "voice 42",
            "tester",
            "@5分前",
            "45秒",
        )))
        .expect(1) // the second walk must short-circuit at the existence check
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sound/42.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_payload(42)))
        .expect(1) // audio downloaded exactly once
        .mount(&server)
        .await;

    let first = scrape(&config, None).await.unwrap();
    assert_eq!(first.new_voices, 1);

    let second = scrape(&config, None).await.unwrap();
    assert_eq!(second.new_voices, 0);
    assert_eq!(second.already_known, 1);

    let store = open_storage(std::path::Path::new(&config.storage.database_path)).unwrap();
    assert_eq!(store.count_voices(None).unwrap(), 1);
}

#[tokio::test]
async fn test_item_failure_does_not_abort_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let ids: Vec<u32> = (1..=10).collect();
    mount_listing(&server, 1, listing_html(&ids, &[])).await;

    for id in &ids {
        if *id == 3 {
            // Item 3's detail fetch blows up; everything else is healthy
            Mock::given(method("GET"))
                .and(path("/detail.php"))
                .and(query_param("n", "3"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;
        } else {
            mount_voice(&server, *id).await;
        }
    }

    let summary = scrape(&config, None).await.unwrap();

    assert_eq!(summary.new_voices, 9);
    assert_eq!(summary.failed_items, 1);

    let store = open_storage(std::path::Path::new(&config.storage.database_path)).unwrap();
    assert!(!store.exists("3").unwrap());
    for id in ids.iter().filter(|id| **id != 3) {
        assert!(store.exists(&id.to_string()).unwrap(), "id {} missing", id);
    }
}

#[tokio::test]
async fn test_failed_listing_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    mount_listing(&server, 1, listing_html(&[1], &[1, 2, 3])).await;
    Mock::given(method("GET"))
        .and(path("/list.php"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_listing(&server, 3, listing_html(&[3], &[])).await;
    for id in [1, 3] {
        mount_voice(&server, id).await;
    }

    let summary = scrape(&config, None).await.unwrap();

    // Page 2 contributes zero but the walk reaches page 3
    assert_eq!(summary.pages_walked, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.new_voices, 2);
}

#[tokio::test]
async fn test_unfetchable_first_page_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/list.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = scrape(&config, None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_rerun_after_interruption_skips_committed_work() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    mount_listing(&server, 1, listing_html(&[1, 2], &[1, 2])).await;
    mount_listing(&server, 2, listing_html(&[3, 4], &[1, 2])).await;
    for id in [1, 2, 3, 4] {
        mount_voice(&server, id).await;
    }

    // Simulate a previous run that committed page 1 and then died: ids 1 and
    // 2 are already in the store.
    {
        let mut store =
            open_storage(std::path::Path::new(&config.storage.database_path)).unwrap();
        let now = chrono::Utc::now();
        for id in ["1", "2"] {
            store
                .insert(&NewVoice {
                    external_id: id.to_string(),
                    title: format!("voice {}", id),
                    author: "tester".to_string(),
                    posted_at: now,
                    duration_seconds: Some(62),
                    downloaded_at: now,
                    file_path: format!("{}/{}.mp3", config.storage.downloads_dir, id),
                })
                .unwrap();
        }
    }

    // The re-run re-derives the range, re-walks from page 1, and skips the
    // committed ids without error or duplication.
    let summary = scrape(&config, None).await.unwrap();

    assert_eq!(summary.pages_walked, 2);
    assert_eq!(summary.already_known, 2);
    assert_eq!(summary.new_voices, 2);
    assert_eq!(summary.failed_items, 0);

    let store = open_storage(std::path::Path::new(&config.storage.database_path)).unwrap();
    assert_eq!(store.count_voices(None).unwrap(), 4);
}

#[tokio::test]
async fn test_duplicate_links_within_page_processed_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    // The same detail link appears three times on the page
    let mut html = String::from("<html><body>");
    for _ in 0..3 {
        html.push_str(r#"<div class="content"><a href="detail.php?n=7">seven</a></div>"#);
    }
    html.push_str("</body></html>");
    mount_listing(&server, 1, html).await;

    Mock::given(method("GET"))
        .and(path("/detail.php"))
        .and(query_param("n", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_html(
            "seven",
            "tester",
            "@1時間前",
            "3分",
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sound/7.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_payload(7)))
        .expect(1)
        .mount(&server)
        .await;

    let summary = scrape(&config, None).await.unwrap();
    assert_eq!(summary.new_voices, 1);
}
