//! HTTP transport and result downloader tests against a mock server

use catalog_common::config::StoreEndpoint;
use catalog_sync::error::SyncError;
use catalog_sync::models::GraphqlRequest;
use catalog_sync::services::{
    fetch_recent_products, GraphqlTransport, HttpDownloader, HttpTransport, ResultDownloader,
};
use serde_json::json;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer) -> StoreEndpoint {
    StoreEndpoint::new(format!("{}/admin/api/graphql.json", server.uri()), "shpat_test")
}

#[tokio::test]
async fn transport_posts_query_and_variables_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/graphql.json"))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "query": "query($n: Int!) { shop { name } }",
            "variables": { "n": 3 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"ok":true}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let request = GraphqlRequest::with_variables("query($n: Int!) { shop { name } }", json!({ "n": 3 }));
    let body = transport.send(&endpoint(&server), &request).await.unwrap();

    assert_eq!(body, br#"{"data":{"ok":true}}"#.to_vec());
}

#[tokio::test]
async fn transport_returns_body_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"errors":"Invalid API key"}"#))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let body = transport
        .send(&endpoint(&server), &GraphqlRequest::new("{ shop { name } }"))
        .await
        .unwrap();

    assert_eq!(body, br#"{"errors":"Invalid API key"}"#.to_vec());
}

#[tokio::test]
async fn transport_connection_failure_is_transport_error() {
    let transport = HttpTransport::new().unwrap();
    let unreachable = StoreEndpoint::new("http://127.0.0.1:1/graphql.json", "token");

    let result = transport
        .send(&unreachable, &GraphqlRequest::new("{ shop { name } }"))
        .await;

    assert!(matches!(result, Err(SyncError::Transport(_))));
}

#[tokio::test]
async fn live_product_query_returns_edges() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "query": catalog_sync::services::product_query::build_recent_products_request(3).query,
            "variables": { "first": 3 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "products": {
                    "edges": [
                        { "node": { "id": "gid://shopify/Product/1", "title": "Shirt" } },
                        { "node": { "id": "gid://shopify/Product/2", "title": "Hat" } }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let edges = fetch_recent_products(&transport, &endpoint(&server), 3)
        .await
        .unwrap();

    assert_eq!(edges.len(), 2);
    assert_eq!(edges[1].node.title, "Hat");
}

#[tokio::test]
async fn downloader_streams_result_into_scratch_file() {
    let server = MockServer::start().await;
    let contents = "{\"id\":\"p1\"}\n{\"id\":\"p2\"}\n";
    Mock::given(method("GET"))
        .and(path("/bulk/result.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(contents))
        .expect(1)
        .mount(&server)
        .await;

    let scratch_dir = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::new().unwrap();
    let scratch = downloader
        .download(&format!("{}/bulk/result.jsonl", server.uri()), scratch_dir.path())
        .await
        .unwrap();

    let mut read_back = String::new();
    scratch
        .open()
        .await
        .unwrap()
        .read_to_string(&mut read_back)
        .await
        .unwrap();
    assert_eq!(read_back, contents);

    let path = scratch.path_buf();
    drop(scratch);
    assert!(!path.exists());
}

#[tokio::test]
async fn downloader_rejects_error_status_without_leaving_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let scratch_dir = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::new().unwrap();
    let result = downloader
        .download(&format!("{}/bulk/expired.jsonl", server.uri()), scratch_dir.path())
        .await;

    match result {
        Err(SyncError::Fetch(msg)) => assert!(msg.contains("403")),
        other => panic!("expected Fetch error, got {:?}", other.map(|s| s.path_buf())),
    }
    assert_eq!(std::fs::read_dir(scratch_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn downloader_waits_out_slow_response_within_idle_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"id\":\"p1\"}\n")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let scratch_dir = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::with_idle_timeout(Duration::from_secs(5)).unwrap();
    let scratch = downloader
        .download(&format!("{}/bulk/slow.jsonl", server.uri()), scratch_dir.path())
        .await
        .unwrap();

    let mut read_back = String::new();
    scratch
        .open()
        .await
        .unwrap()
        .read_to_string(&mut read_back)
        .await
        .unwrap();
    assert_eq!(read_back, "{\"id\":\"p1\"}\n");
}

#[tokio::test]
async fn downloader_stalled_stream_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"id\":\"p1\"}\n")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let scratch_dir = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::with_idle_timeout(Duration::from_millis(100)).unwrap();
    let result = downloader
        .download(&format!("{}/bulk/stalled.jsonl", server.uri()), scratch_dir.path())
        .await;

    match result {
        Err(SyncError::Fetch(msg)) => assert!(msg.contains("stalled")),
        other => panic!("expected Fetch error, got {:?}", other.map(|s| s.path_buf())),
    }
    assert_eq!(std::fs::read_dir(scratch_dir.path()).unwrap().count(), 0);
}
