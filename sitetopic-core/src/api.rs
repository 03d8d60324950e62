//! Request boundary.
//!
//! Every external operation returns a ready-to-send JSON value. This is the
//! only place where errors become `{"error": ...}` / `500` responses.

use crate::error::ServiceError;
use crate::service::{Classification, ClassificationService};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

/// Body of a `check_urls` request.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlsRequest {
    pub urls: Vec<String>,
}

pub fn ping() -> Value {
    json!({ "message": "pong" })
}

pub async fn get_pages(service: &ClassificationService, url: &str, depth: usize) -> Value {
    match service.discover_pages(url, depth).await {
        Ok(links) => ok(json!({ "links": links })),
        Err(e) => failure(url, &e),
    }
}

pub async fn check_url(service: &ClassificationService, url: &str, depth: usize) -> Value {
    match service.classify_url(url, depth).await {
        Ok(classification) if depth <= 1 => single(&classification),
        Ok(classification) => ok(ranked(&classification)),
        Err(e) => failure(url, &e),
    }
}

/// Classify each URL of `body`; failures are reported inline per URL.
pub async fn check_urls(service: &ClassificationService, body: &Value, depth: usize) -> Value {
    let request: UrlsRequest = match serde_json::from_value(body.clone()) {
        Ok(request) => request,
        Err(e) => {
            let e = ServiceError::InvalidRequest(e.to_string());
            return failure("check_urls", &e);
        }
    };

    let mut data = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        let mut item = match service.classify_url(url, depth).await {
            Ok(classification) if depth <= 1 => single(&classification),
            Ok(classification) => ranked(&classification),
            Err(e) => {
                warn!("Failed to classify {}: {}", url, e);
                json!({ "error": e.to_string() })
            }
        };
        if let Value::Object(ref mut map) = item {
            map.insert("url".to_string(), Value::String(url.clone()));
        }
        data.push(item);
    }

    ok(Value::Array(data))
}

pub async fn check_domain(service: &ClassificationService, url: &str, depth: usize) -> Value {
    match service.classify_domain(url, depth).await {
        Ok(classification) => ok(ranked(&classification)),
        Err(e) => failure(url, &e),
    }
}

fn ok(data: Value) -> Value {
    json!({ "code": 200, "data": data })
}

fn failure(target: &str, error: &ServiceError) -> Value {
    warn!("Request for {} failed: {}", target, error);
    json!({ "code": 500, "data": { "error": error.to_string() } })
}

/// Top theme and its category, `null` when nothing matched.
fn single(classification: &Classification) -> Value {
    json!({
        "category": classification.categories.first().cloned().flatten(),
        "theme": classification.themes.first(),
    })
}

fn ranked(classification: &Classification) -> Value {
    json!({
        "categories": classification.categories,
        "themes": classification.themes,
    })
}
