// Shared fixtures for the service and API tests
#![allow(dead_code)]

use sitetopic_core::config::ContentMode;
use sitetopic_core::{CategoryTable, ClassificationService, KeywordTable, ResultCache};
use sitetopic_scanner::strategy::{DEFAULT_USER_AGENT, build_client};
use sitetopic_scanner::{RenderedStrategy, StaticStrategy};
use std::path::Path;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const SCENARIO_TEXT: &str = "Ремонт и установка, ремонт окон.";

pub fn keyword_table() -> KeywordTable {
    [
        ("ремонт", "repair".to_string()),
        ("установка", "install".to_string()),
    ]
    .into_iter()
    .collect()
}

pub fn category_table() -> CategoryTable {
    [("repair", "Services".to_string())].into_iter().collect()
}

/// Service over the scenario tables, reading page text with plain GETs.
pub fn service_for(server: &MockServer, cache_path: &Path) -> ClassificationService {
    let client = build_client(DEFAULT_USER_AGENT, 5).unwrap();
    let rendered =
        RenderedStrategy::new(client.clone(), &format!("{}/render", server.uri())).unwrap();

    ClassificationService::new(
        Arc::new(keyword_table()),
        Arc::new(category_table()),
        ResultCache::open(cache_path),
        Arc::new(StaticStrategy::new(client)),
        Arc::new(rendered),
    )
    .with_content_mode(ContentMode::Static)
}

pub fn text_page(text: &str) -> String {
    format!("<html><body><div>{}</div></body></html>", text)
}

pub fn links_page(base: &str, routes: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for route in routes {
        html.push_str(&format!(r#"<a href="{}{}">{}</a>"#, base, route, route));
    }
    html.push_str("</body></html>");
    html
}

pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Like [`mount_page`] but fails the test unless fetched exactly `times` times.
pub async fn mount_page_expect(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_error(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
