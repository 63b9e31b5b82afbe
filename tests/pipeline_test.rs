//! End-to-end tests for a collection run against mocked APIs.

use habomai_scraper::config::Config;
use habomai_scraper::pipeline;
use habomai_scraper::store::load_posts;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT_HTML: &str = r#"<!DOCTYPE html>
<html><body><ol id="stream-items-id">
  <li class="js-stream-item">
    <div class="tweet js-stream-tweet" data-tweet-id="100">
      <a class="tweet-timestamp"><span class="js-short-timestamp" data-time="1577836800">1月1日</span></a>
      <p class="tweet-text">最高だった、次郎、1000YENの特上セット、また行く pic.twitter.com/xyz</p>
      <div class="AdaptiveMedia-photoContainer js-adaptive-photo" data-image-url="https://pbs.twimg.com/media/snap.jpg"></div>
    </div>
  </li>
  <li class="js-stream-item">
    <div class="tweet js-stream-tweet has-profile-promoted-tweet" data-tweet-id="999">
      <p class="tweet-text">広告、どこか、1YEN</p>
    </div>
  </li>
  <li class="js-stream-item">
    <div class="tweet js-stream-tweet" data-tweet-id="90">
      <p class="tweet-text">お知らせです</p>
    </div>
  </li>
</ol></body></html>"#;

const TIMELINE_JSON: &str = r#"[
  {
    "id_str": "130",
    "created_at": "Thu Jan 02 01:00:00 +0000 2020",
    "text": "寒い、次郎 目黒店、ラーメン小750YEN",
    "entities": {"media": [{"media_url_https": "https://pbs.twimg.com/media/api.jpg"}]}
  }
]"#;

const PLACE_JSON: &str = r#"{
  "status": "OK",
  "results": [
    {"formatted_address": "東京都", "geometry": {"location": {"lat": 35.5, "lng": 139.5}}}
  ]
}"#;

async fn setup(snapshot: &str) -> (MockServer, TempDir, Config) {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let snapshot_path = temp_dir.path().join("twitter.html");
    tokio::fs::write(&snapshot_path, snapshot).await.unwrap();

    let config = Config {
        snapshot_path,
        output_path: temp_dir.path().join("data").join("habomai.json"),
        twitter_api_url: mock_server.uri(),
        places_api_url: mock_server.uri(),
        ..Config::for_testing()
    };
    (mock_server, temp_dir, config)
}

async fn mount_timeline(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/user_timeline.json"))
        .and(query_param("since_id", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TIMELINE_JSON, "application/json"))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_run_merges_snapshot_then_timeline() {
    let (mock_server, _temp_dir, config) = setup(SNAPSHOT_HTML).await;
    mount_timeline(&mock_server).await;

    let summary = pipeline::run(&config, false).await.expect("run failed");

    assert_eq!(summary.snapshot_posts, 2);
    assert_eq!(summary.timeline_posts, 1);
    assert_eq!(summary.total_posts(), 3);
    assert!(summary.places.is_none());

    let posts = load_posts(&config.output_path).await.unwrap();
    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["100", "90", "130"]);

    let first = &posts[0];
    assert_eq!(first.place.as_ref().unwrap().name, "次郎");
    assert_eq!(first.price, Some(1000));
    assert_eq!(first.commentary, "最高だった また行く");
    assert_eq!(first.image_urls, vec!["https://pbs.twimg.com/media/snap.jpg"]);
    assert_eq!(
        first.timestamp.unwrap().to_rfc3339(),
        "2020-01-01T09:00:00+09:00"
    );

    let from_api = &posts[2];
    assert_eq!(from_api.menu.as_deref(), Some("ラーメン小"));
    assert_eq!(from_api.price, Some(750));
    assert!(!from_api.place.as_ref().unwrap().is_enriched());
}

#[tokio::test]
async fn test_run_with_places_enriches_named_posts() {
    let (mock_server, _temp_dir, config) = setup(SNAPSHOT_HTML).await;
    mount_timeline(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PLACE_JSON, "application/json"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let summary = pipeline::run(&config, true).await.expect("run failed");
    let stats = summary.places.expect("enrichment should have run");
    assert_eq!(stats.requested, 2);
    assert_eq!(stats.enriched, 2);

    let posts = load_posts(&config.output_path).await.unwrap();
    let named: Vec<_> = posts.iter().filter_map(|p| p.place.as_ref()).collect();
    assert_eq!(named.len(), 2);
    assert!(named.iter().all(|p| p.address == "東京都"));
    assert!(posts[1].place.is_none());
}

#[tokio::test]
async fn test_run_without_snapshot_posts_fetches_everything() {
    let (mock_server, _temp_dir, config) = setup("<html><body></body></html>").await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TIMELINE_JSON, "application/json"))
        .mount(&mock_server)
        .await;

    let summary = pipeline::run(&config, false).await.unwrap();
    assert_eq!(summary.snapshot_posts, 0);
    assert_eq!(summary.timeline_posts, 1);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests[0].url.query_pairs().any(|(k, _)| k == "since_id"));
}

#[tokio::test]
async fn test_run_fails_without_snapshot() {
    let (_mock_server, temp_dir, config) = setup(SNAPSHOT_HTML).await;
    let config = Config {
        snapshot_path: temp_dir.path().join("missing.html"),
        ..config
    };

    assert!(pipeline::run(&config, false).await.is_err());
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_run_fails_when_timeline_fails() {
    let (mock_server, _temp_dir, config) = setup(SNAPSHOT_HTML).await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    assert!(pipeline::run(&config, false).await.is_err());
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_strict_price_aborts_run() {
    let snapshot = r#"<div class="js-stream-tweet" data-tweet-id="100">
        <p class="tweet-text">並んだ、次郎、ラーメン</p></div>"#;
    let (_mock_server, _temp_dir, config) = setup(snapshot).await;
    let config = Config {
        strict_price: true,
        ..config
    };

    let err = pipeline::run(&config, false).await.unwrap_err();
    assert!(format!("{err:#}").contains("no price marker"));
}
