pub mod analyzer;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use analyzer::{RankedEntry, TopicAnalyzer};
pub use cache::{CacheEntry, ResultCache};
pub use config::AppConfig;
pub use error::{ServiceError, StoreError};
pub use service::{Classification, ClassificationService, PageReport};
pub use store::{AssocStore, CategoryTable, KeywordTable};
