use crate::strategy::StrategyKind;
use serde::{Deserialize, Serialize};

/// A page that could not be fetched during a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of one crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub seed: String,
    pub strategy: StrategyKind,
    /// Discovered absolute URLs in discovery order, without duplicates.
    pub links: Vec<String>,
    pub failures: Vec<FetchFailure>,
}

impl CrawlResult {
    pub fn new(seed: String, strategy: StrategyKind) -> Self {
        Self {
            seed,
            strategy,
            links: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
