use crate::error::{Result, ScanError};
use crate::html;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.96 Safari/537.36";

/// Which backend a crawl was driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Static,
    Rendered,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Static => "static",
            StrategyKind::Rendered => "rendered",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response of one fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body, or a [`ScanError::Status`] if the fetch did not succeed.
    pub fn into_body(self) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ScanError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// A way of turning a URL into HTML.
///
/// The crawler and the classification service only talk to this trait, so the
/// static and rendered backends are interchangeable.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Fetch `url`. Non-2xx statuses are returned, not raised.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Visible text of the page at `url`.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let body = self.fetch(url).await?.into_body()?;
        Ok(html::extract_visible_text(&body))
    }

    /// Absolute links found on the page at `url`.
    async fn discover_links(&self, url: &str) -> Result<Vec<String>> {
        let body = self.fetch(url).await?.into_body()?;
        Ok(html::extract_links(&body, url))
    }
}

/// Build the shared HTTP client used by both strategies.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    let timeout_secs = timeout_secs.max(1);
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(ScanError::from)
}

/// Plain GET of the page, no script execution.
#[derive(Clone)]
pub struct StaticStrategy {
    client: Client,
}

impl StaticStrategy {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for StaticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Static
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("Static fetch {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }
}

/// Fetch through a rendering service that executes the page's scripts.
///
/// The service is queried as `GET {endpoint}?url={page}` and must answer with
/// the rendered HTML.
#[derive(Clone)]
pub struct RenderedStrategy {
    client: Client,
    endpoint: Url,
}

impl RenderedStrategy {
    pub fn new(client: Client, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ScanError::InvalidUrl(format!("render endpoint {}: {}", endpoint, e)))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl FetchStrategy for RenderedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rendered
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("Rendered fetch {} via {}", url, self.endpoint);
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("url", url)])
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn client() -> Client {
        build_client(DEFAULT_USER_AGENT, 5).unwrap()
    }

    #[tokio::test]
    async fn test_static_fetch_returns_status_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&mock_server)
            .await;

        let strategy = StaticStrategy::new(client());
        let page = strategy
            .fetch(&format!("{}/missing", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(page.status, 404);
        assert_eq!(page.body, "gone");
        assert!(!page.is_success());
    }

    #[tokio::test]
    async fn test_static_discover_links_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string(r#"<a href="/a">A</a>"#),
            )
            .mount(&mock_server)
            .await;

        let strategy = StaticStrategy::new(client());
        let result = strategy.discover_links(&mock_server.uri()).await;

        assert!(matches!(result, Err(ScanError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_rendered_fetch_goes_through_render_endpoint() {
        let mock_server = MockServer::start().await;
        let target = "https://shop.example/catalog";

        Mock::given(method("GET"))
            .and(path("/render"))
            .and(query_param("url", target))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div>Rendered text</div><a href="/item/1">1</a>"#,
            ))
            .mount(&mock_server)
            .await;

        let strategy =
            RenderedStrategy::new(client(), &format!("{}/render", mock_server.uri())).unwrap();

        assert_eq!(strategy.kind(), StrategyKind::Rendered);
        assert_eq!(strategy.endpoint().path(), "/render");
        assert_eq!(strategy.fetch_page(target).await.unwrap(), "Rendered text\n");
        assert_eq!(
            strategy.discover_links(target).await.unwrap(),
            vec!["https://shop.example/item/1".to_string()]
        );
    }

    #[test]
    fn test_rendered_strategy_invalid_endpoint() {
        let result = RenderedStrategy::new(client(), "not an endpoint");
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }
}
