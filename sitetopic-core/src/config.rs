use crate::error::ConfigError;
use crate::store::{DEFAULT_INITIAL_BUCKETS, DEFAULT_LOAD_FACTOR};
use serde::{Deserialize, Serialize};
use sitetopic_scanner::CrawlerSettings;
use sitetopic_scanner::strategy::DEFAULT_USER_AGENT;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/sitetopic/config.json";

/// Where page text for classification comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    Rendered,
    Static,
}

/// How `classify_domain` combines the results of the crawled links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainAggregation {
    /// Report only the last link that classified successfully.
    LastWrite,
    /// Union of every link's categories and themes in first-seen order.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub initial_buckets: usize,
    pub load_factor: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub keywords_path: PathBuf,
    pub categories_path: PathBuf,
    pub cache_path: PathBuf,
    pub render_endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub crawler: CrawlerSettings,
    pub store: StoreSettings,
    pub content_mode: ContentMode,
    pub domain_aggregation: DomainAggregation,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keywords_path: PathBuf::from("data/keywords.json"),
            categories_path: PathBuf::from("data/categories.json"),
            cache_path: PathBuf::from("data/cache.json"),
            render_endpoint: "http://127.0.0.1:3000/render".to_string(),
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            crawler: CrawlerSettings::default(),
            store: StoreSettings::default(),
            content_mode: ContentMode::Rendered,
            domain_aggregation: DomainAggregation::LastWrite,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_path(path);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let mut config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.expand_paths();
        Ok(config)
    }

    /// Expand `~` in every configured path.
    pub fn expand_paths(&mut self) {
        self.keywords_path = expand_path(&self.keywords_path);
        self.categories_path = expand_path(&self.categories_path);
        self.cache_path = expand_path(&self.cache_path);
    }
}

pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}
