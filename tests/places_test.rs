//! Integration tests for the places text-search client and enrichment.

use std::sync::Arc;
use std::time::Duration;

use habomai_scraper::config::Config;
use habomai_scraper::places::{enrich_places, PlaceLookup, PlacesClient};
use habomai_scraper::post::{Place, Post};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/maps/api/place/textsearch/json";

const FOUND_JSON: &str = r#"{
  "status": "OK",
  "results": [
    {
      "formatted_address": "日本、〒108-0073 東京都港区三田２丁目１６−４",
      "geometry": {"location": {"lat": 35.5, "lng": 139.75}}
    },
    {
      "formatted_address": "somewhere else",
      "geometry": {"location": {"lat": 1.0, "lng": 2.0}}
    }
  ]
}"#;

fn create_test_config(places_url: &str) -> Config {
    Config {
        places_api_url: places_url.to_string(),
        ..Config::for_testing()
    }
}

fn post_with_place(id: &str, place: Option<&str>) -> Post {
    let mut post = Post::new(id, "body");
    post.place = place.map(Place::named);
    post
}

#[tokio::test]
async fn test_text_search_uses_first_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "ラーメン二郎 三田本店"))
        .and(query_param("language", "ja"))
        .and(query_param("key", "test-place-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FOUND_JSON, "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PlacesClient::new(&create_test_config(&mock_server.uri())).unwrap();
    let details = client
        .text_search("ラーメン二郎 三田本店")
        .await
        .unwrap()
        .expect("expected a match");

    assert_eq!(
        details.address,
        "日本、〒108-0073 東京都港区三田２丁目１６−４"
    );
    assert!((details.lat - 35.5).abs() < f64::EPSILON);
    assert!((details.lng - 139.75).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_text_search_zero_results() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": "ZERO_RESULTS", "results": []}"#,
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let client = PlacesClient::new(&create_test_config(&mock_server.uri())).unwrap();
    assert!(client.text_search("存在しない店").await.unwrap().is_none());
}

#[tokio::test]
async fn test_text_search_denied_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "results": []}"#,
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let client = PlacesClient::new(&create_test_config(&mock_server.uri())).unwrap();
    let err = client.text_search("次郎").await.unwrap_err();
    assert!(err.to_string().contains("REQUEST_DENIED"));
}

#[tokio::test]
async fn test_enrichment_issues_one_request_per_named_place() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "壊れた店"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FOUND_JSON, "application/json"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let lookup: Arc<dyn PlaceLookup> = Arc::new(PlacesClient::new(&config).unwrap());

    let mut posts = vec![
        post_with_place("1", Some("次郎")),
        post_with_place("2", None),
        post_with_place("3", Some("壊れた店")),
        post_with_place("4", None),
        post_with_place("5", Some("次郎 目黒店")),
    ];

    let stats = enrich_places(lookup, &mut posts, 2, Duration::from_secs(5)).await;

    assert_eq!(stats.requested, 3);
    assert_eq!(stats.enriched, 2);
    assert_eq!(stats.failed, 1);

    assert!(posts[0].place.as_ref().unwrap().is_enriched());
    assert!(posts[4].place.as_ref().unwrap().is_enriched());
    assert!(!posts[2].place.as_ref().unwrap().is_enriched());
    assert!(posts[1].place.is_none());
    assert!(posts[3].place.is_none());
}
