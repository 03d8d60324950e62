use crate::analyzer::{RankedEntry, TopicAnalyzer};
use crate::cache::{CacheEntry, ResultCache};
use crate::config::{AppConfig, ContentMode, DomainAggregation, StoreSettings};
use crate::error::{Result, StoreError};
use crate::store::{AssocStore, CategoryTable, KeywordTable};
use serde::Serialize;
use sitetopic_scanner::strategy::build_client;
use sitetopic_scanner::{
    CrawlerSettings, FetchStrategy, FrontierCrawler, RenderedStrategy, StaticStrategy,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Ranked themes of a page and the category of each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub categories: Vec<Option<String>>,
    pub themes: Vec<String>,
}

impl Classification {
    /// Append the themes of `other` not seen yet, with their categories.
    pub fn merge(&mut self, other: Classification) {
        for (category, theme) in other.categories.into_iter().zip(other.themes) {
            if !self.themes.contains(&theme) {
                self.categories.push(category);
                self.themes.push(theme);
            }
        }
    }

    pub fn truncate(&mut self, depth: usize) {
        self.categories.truncate(depth);
        self.themes.truncate(depth);
    }
}

impl From<CacheEntry> for Classification {
    fn from(entry: CacheEntry) -> Self {
        Self {
            categories: entry.categories,
            themes: entry.themes,
        }
    }
}

/// Uncached scoring details for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub url: String,
    pub scores: Vec<RankedEntry>,
    pub keywords: Vec<RankedEntry>,
}

/// Cache-first page classification on top of the crawler and analyzer.
///
/// Tables and cache are injected; nothing here is global, so tests can build
/// a service around fabricated tables and a temporary cache file.
pub struct ClassificationService {
    keywords: Arc<KeywordTable>,
    categories: Arc<CategoryTable>,
    cache: Mutex<ResultCache>,
    static_strategy: Arc<dyn FetchStrategy>,
    rendered_strategy: Arc<dyn FetchStrategy>,
    content_mode: ContentMode,
    crawler_settings: CrawlerSettings,
    aggregation: DomainAggregation,
}

impl ClassificationService {
    pub fn new(
        keywords: Arc<KeywordTable>,
        categories: Arc<CategoryTable>,
        cache: ResultCache,
        static_strategy: Arc<dyn FetchStrategy>,
        rendered_strategy: Arc<dyn FetchStrategy>,
    ) -> Self {
        Self {
            keywords,
            categories,
            cache: Mutex::new(cache),
            static_strategy,
            rendered_strategy,
            content_mode: ContentMode::Rendered,
            crawler_settings: CrawlerSettings::default(),
            aggregation: DomainAggregation::LastWrite,
        }
    }

    /// Load tables, open the cache and build both fetch strategies.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let keywords = load_table(&config.keywords_path, &config.store)?;
        let categories = load_table(&config.categories_path, &config.store)?;
        info!(
            "Loaded {} keywords and {} categories",
            keywords.len(),
            categories.len()
        );

        let cache = ResultCache::open(&config.cache_path);
        let client = build_client(&config.user_agent, config.timeout_secs)?;
        let static_strategy = Arc::new(StaticStrategy::new(client.clone()));
        let rendered_strategy = Arc::new(RenderedStrategy::new(client, &config.render_endpoint)?);

        Ok(Self::new(
            Arc::new(keywords),
            Arc::new(categories),
            cache,
            static_strategy,
            rendered_strategy,
        )
        .with_content_mode(config.content_mode)
        .with_crawler_settings(config.crawler.clone())
        .with_domain_aggregation(config.domain_aggregation))
    }

    pub fn with_content_mode(mut self, mode: ContentMode) -> Self {
        self.content_mode = mode;
        self
    }

    pub fn with_crawler_settings(mut self, settings: CrawlerSettings) -> Self {
        self.crawler_settings = settings;
        self
    }

    pub fn with_domain_aggregation(mut self, aggregation: DomainAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// A fresh crawler sharing this service's strategies.
    pub fn crawler(&self) -> FrontierCrawler {
        FrontierCrawler::new(self.static_strategy.clone(), self.rendered_strategy.clone())
            .with_settings(self.crawler_settings.clone())
    }

    fn content_strategy(&self) -> &Arc<dyn FetchStrategy> {
        match self.content_mode {
            ContentMode::Rendered => &self.rendered_strategy,
            ContentMode::Static => &self.static_strategy,
        }
    }

    /// Classify one page, serving from the cache when possible.
    ///
    /// The cache always receives the full ranking; `depth` only trims what is
    /// returned. The cache lock is held from lookup to write so two requests
    /// for the same new URL cannot both miss.
    pub async fn classify_url(&self, url: &str, depth: usize) -> Result<Classification> {
        let depth = depth.max(1);
        let mut cache = self.cache.lock().await;

        if let Some(entry) = cache.get(url) {
            debug!("Cache hit for {}", url);
            return Ok(entry.truncated(depth).into());
        }

        // The lock stays held across the fetch, so misses for different URLs
        // are serialized too, each bounded by the client timeout.
        debug!("Cache miss for {}, fetching", url);
        let text = self.content_strategy().fetch_page(url).await?;
        let entry = self.classify_text(&text);
        cache.set(url, entry.clone())?;

        Ok(entry.truncated(depth).into())
    }

    /// Full ranking for `text`, with the category of every theme.
    pub fn classify_text(&self, text: &str) -> CacheEntry {
        let mut analyzer = TopicAnalyzer::new();
        analyzer.analyze(text, &self.keywords);

        let themes: Vec<String> = analyzer.rank(None).into_iter().map(|e| e.label).collect();
        let categories = themes.iter().map(|theme| self.category_of(theme)).collect();
        CacheEntry::new(categories, themes)
    }

    /// Category for `topic`, `None` when unmapped.
    pub fn category_of(&self, topic: &str) -> Option<String> {
        match self.categories.get(topic) {
            Ok(category) => Some(category.clone()),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => {
                warn!("Category lookup for {} failed: {}", topic, e);
                None
            }
        }
    }

    /// Links discovered from `url`, at most `depth` of them.
    pub async fn discover_pages(&self, url: &str, depth: usize) -> Result<Vec<String>> {
        let depth = depth.max(1);
        let mut crawler = self.crawler();
        let mut result = crawler.crawl(url, depth).await?;
        result.links.truncate(depth);
        Ok(result.links)
    }

    /// Crawl `url` and classify the first `depth` discovered links.
    ///
    /// With [`DomainAggregation::LastWrite`] the answer is the result of the
    /// last link that classified successfully, earlier links are overwritten.
    /// Links that fail to classify are logged and skipped.
    pub async fn classify_domain(&self, url: &str, depth: usize) -> Result<Classification> {
        let depth = depth.max(1);
        let links = self.discover_pages(url, depth).await?;

        let mut aggregate = Classification::default();
        for link in &links {
            match self.classify_url(link, depth).await {
                Ok(classification) => match self.aggregation {
                    DomainAggregation::LastWrite => aggregate = classification,
                    DomainAggregation::Merge => aggregate.merge(classification),
                },
                Err(e) => warn!("Failed to classify {}: {}", link, e),
            }
        }

        aggregate.truncate(depth);
        Ok(aggregate)
    }

    /// Score `url` without touching the cache.
    pub async fn analyze_url(&self, url: &str) -> Result<PageReport> {
        let text = self.content_strategy().fetch_page(url).await?;

        let mut analyzer = TopicAnalyzer::new();
        analyzer.analyze(&text, &self.keywords);

        Ok(PageReport {
            url: url.to_string(),
            scores: analyzer.rank(None),
            keywords: analyzer.rank_frequent_keywords(),
        })
    }
}

fn load_table(path: &Path, settings: &StoreSettings) -> std::result::Result<AssocStore<String>, StoreError> {
    let mut table = AssocStore::with_capacity(settings.initial_buckets, settings.load_factor)?;
    table.load(path)?;
    Ok(table)
}
