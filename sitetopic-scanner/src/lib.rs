pub mod crawler;
pub mod error;
pub mod html;
pub mod result;
pub mod strategy;

pub use crawler::{CrawlerSettings, FrontierCrawler, ProgressCallback};
pub use error::ScanError;
pub use result::{CrawlResult, FetchFailure};
pub use strategy::{FetchStrategy, FetchedPage, RenderedStrategy, StaticStrategy, StrategyKind};
