// Tests for the request boundary response shapes

mod common;

use common::*;
use serde_json::json;
use sitetopic_core::api;
use tempfile::TempDir;
use wiremock::MockServer;

#[test]
fn test_ping() {
    assert_eq!(api::ping(), json!({ "message": "pong" }));
}

#[tokio::test]
async fn test_get_pages_success() {
    let server = MockServer::start().await;
    let uri = server.uri();
    mount_page(&server, "/", links_page(&uri, &["/a", "/b", "/c", "/d", "/e"])).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::get_pages(&service, &uri, 1).await;

    assert_eq!(
        response,
        json!({ "code": 200, "data": { "links": [format!("{}/a", uri)] } })
    );
}

#[tokio::test]
async fn test_get_pages_failure() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::get_pages(&service, "not a url", 1).await;

    assert_eq!(response["code"], 500);
    assert!(response["data"]["error"].as_str().unwrap().contains("Invalid URL"));
}

#[tokio::test]
async fn test_check_url_depth_one_shape() {
    let server = MockServer::start().await;
    mount_page(&server, "/page", text_page(SCENARIO_TEXT)).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::check_url(&service, &format!("{}/page", server.uri()), 1).await;

    assert_eq!(response, json!({ "category": "Services", "theme": "repair" }));
}

#[tokio::test]
async fn test_check_url_depth_one_without_matches() {
    let server = MockServer::start().await;
    mount_page(&server, "/page", text_page("no keywords")).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::check_url(&service, &format!("{}/page", server.uri()), 1).await;

    assert_eq!(response, json!({ "category": null, "theme": null }));
}

#[tokio::test]
async fn test_check_url_deeper_shape() {
    let server = MockServer::start().await;
    mount_page(&server, "/page", text_page(SCENARIO_TEXT)).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::check_url(&service, &format!("{}/page", server.uri()), 2).await;

    assert_eq!(
        response,
        json!({
            "code": 200,
            "data": {
                "categories": ["Services", null],
                "themes": ["repair", "install"]
            }
        })
    );
}

#[tokio::test]
async fn test_check_url_repeated_is_byte_identical() {
    let server = MockServer::start().await;
    mount_page_expect(&server, "/page", text_page(SCENARIO_TEXT), 1).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));
    let url = format!("{}/page", server.uri());

    let first = api::check_url(&service, &url, 1).await.to_string();
    let second = api::check_url(&service, &url, 1).await.to_string();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_check_urls_reports_failures_inline() {
    let server = MockServer::start().await;
    mount_page(&server, "/good", text_page(SCENARIO_TEXT)).await;
    mount_error(&server, "/bad", 500).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));
    let good = format!("{}/good", server.uri());
    let bad = format!("{}/bad", server.uri());

    let response = api::check_urls(&service, &json!({ "urls": [good, bad] }), 1).await;

    assert_eq!(response["code"], 200);
    let data = response["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(
        data[0],
        json!({ "url": good, "category": "Services", "theme": "repair" })
    );
    assert_eq!(data[1]["url"], bad);
    assert!(data[1]["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_check_urls_deeper_shape() {
    let server = MockServer::start().await;
    mount_page(&server, "/good", text_page(SCENARIO_TEXT)).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));
    let good = format!("{}/good", server.uri());

    let response = api::check_urls(&service, &json!({ "urls": [good] }), 3).await;

    assert_eq!(
        response,
        json!({
            "code": 200,
            "data": [{
                "url": good,
                "categories": ["Services", null],
                "themes": ["repair", "install"]
            }]
        })
    );
}

#[tokio::test]
async fn test_check_urls_malformed_body() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::check_urls(&service, &json!({ "links": [] }), 1).await;

    assert_eq!(response["code"], 500);
    assert!(response["data"]["error"].is_string());
}

#[tokio::test]
async fn test_check_domain_shape() {
    let server = MockServer::start().await;
    let uri = server.uri();
    mount_page(&server, "/", links_page(&uri, &["/a", "/b", "/c", "/d"])).await;
    mount_page(&server, "/a", text_page(SCENARIO_TEXT)).await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::check_domain(&service, &uri, 1).await;

    assert_eq!(
        response,
        json!({ "code": 200, "data": { "categories": ["Services"], "themes": ["repair"] } })
    );
}

#[tokio::test]
async fn test_check_domain_failure() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let service = service_for(&server, &temp_dir.path().join("cache.json"));

    let response = api::check_domain(&service, "http://127.0.0.1:1/", 1).await;

    assert_eq!(response["code"], 500);
}
