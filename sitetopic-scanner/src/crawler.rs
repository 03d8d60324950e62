use crate::error::{Result, ScanError};
use crate::html;
use crate::result::{CrawlResult, FetchFailure};
use crate::strategy::FetchStrategy;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Seeds whose static HTML has at most this many links are crawled rendered.
pub const DEFAULT_LINK_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    /// Number of concurrent fetch workers. One worker gives strict BFS order.
    pub workers: usize,
    pub link_threshold: usize,
    /// Report the seed itself as the first discovered link.
    pub include_seed: bool,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            link_threshold: DEFAULT_LINK_THRESHOLD,
            include_seed: false,
        }
    }
}

/// Breadth-first link explorer.
///
/// The backend is chosen once per crawl: the seed is fetched statically and if
/// it carries `link_threshold` links or fewer the page is assumed to be built
/// by scripts, so the whole traversal goes through the rendered strategy.
pub struct FrontierCrawler {
    static_strategy: Arc<dyn FetchStrategy>,
    rendered_strategy: Arc<dyn FetchStrategy>,
    settings: CrawlerSettings,
    progress_callback: Option<ProgressCallback>,
    links: Vec<String>,
}

impl FrontierCrawler {
    pub fn new(
        static_strategy: Arc<dyn FetchStrategy>,
        rendered_strategy: Arc<dyn FetchStrategy>,
    ) -> Self {
        Self {
            static_strategy,
            rendered_strategy,
            settings: CrawlerSettings::default(),
            progress_callback: None,
            links: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: CrawlerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.settings.workers = workers;
        self
    }

    pub fn with_link_threshold(mut self, threshold: usize) -> Self {
        self.settings.link_threshold = threshold;
        self
    }

    pub fn with_include_seed(mut self, include_seed: bool) -> Self {
        self.settings.include_seed = include_seed;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// Probe the seed with a static fetch and pick the traversal backend.
    pub async fn select_strategy(&self, seed: &str) -> Result<Arc<dyn FetchStrategy>> {
        let probe = self.static_strategy.fetch(seed).await?;
        let anchors = html::count_anchors(&probe.body);

        let strategy = if anchors <= self.settings.link_threshold {
            self.rendered_strategy.clone()
        } else {
            self.static_strategy.clone()
        };
        info!(
            "Seed {} has {} links (status {}), using {} strategy",
            seed,
            anchors,
            probe.status,
            strategy.kind()
        );
        Ok(strategy)
    }

    /// Crawl from `seed` until the frontier runs dry or `page_budget` links
    /// have been discovered.
    ///
    /// Failed fetches are recorded in [`CrawlResult::failures`] and skipped.
    /// Only an invalid seed or a failed strategy probe fails the crawl.
    pub async fn crawl(&mut self, seed: &str, page_budget: usize) -> Result<CrawlResult> {
        let seed = Url::parse(seed)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?
            .to_string();
        let workers = self.settings.workers.max(1);
        info!(
            "Starting crawl of {} (budget {}, {} workers)",
            seed, page_budget, workers
        );

        let strategy = self.select_strategy(&seed).await?;
        let frontier = Arc::new(Mutex::new(Frontier::new(
            &seed,
            page_budget,
            self.settings.include_seed,
        )));
        let notify = Arc::new(Notify::new());

        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let strategy = strategy.clone();
            let frontier = frontier.clone();
            let notify = notify.clone();
            let progress_cb = self.progress_callback.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                loop {
                    // Register before inspecting the frontier so a wake-up
                    // between the check and the await is not lost.
                    let notified = notify.notified();
                    let task = frontier.lock().await.next_task();

                    let url = match task {
                        NextTask::Fetch(url) => url,
                        NextTask::Wait => {
                            notified.await;
                            continue;
                        }
                        NextTask::Done => break,
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    let outcome = strategy.discover_links(&url).await;
                    {
                        let mut state = frontier.lock().await;
                        match outcome {
                            Ok(found) => {
                                let accepted = state.accept(found);
                                debug!("[Worker {}] {} new links from {}", worker_id, accepted, url);
                            }
                            Err(e) => {
                                warn!("Crawl error for {}: {}", url, e);
                                state.failures.push(FetchFailure {
                                    url: url.clone(),
                                    error: e.to_string(),
                                });
                            }
                        }
                        state.in_flight -= 1;
                    }
                    notify.notify_waiters();
                }
                debug!("Worker {} finished", worker_id);
            });
            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle.await?;
        }

        let mut state = frontier.lock().await;
        let mut result = CrawlResult::new(seed, strategy.kind());
        result.links = std::mem::take(&mut state.links);
        result.failures = std::mem::take(&mut state.failures);

        info!(
            "Crawl complete. Discovered {} links, {} fetch failures",
            result.links.len(),
            result.failures.len()
        );
        self.links = result.links.clone();
        Ok(result)
    }

    /// Forget the links of the last crawl.
    pub fn clear(&mut self) {
        self.links.clear();
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.links.get(index).map(String::as_str)
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.links.len() {
            Some(self.links.remove(index))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }
}

enum NextTask {
    Fetch(String),
    /// Queue is empty but other workers may still enqueue links.
    Wait,
    Done,
}

/// Traversal state shared by all workers of one crawl.
struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    discovered: HashSet<String>,
    links: Vec<String>,
    failures: Vec<FetchFailure>,
    in_flight: usize,
    budget: usize,
}

impl Frontier {
    fn new(seed: &str, budget: usize, include_seed: bool) -> Self {
        let mut frontier = Self {
            queue: VecDeque::from([seed.to_string()]),
            visited: HashSet::new(),
            discovered: HashSet::new(),
            links: Vec::new(),
            failures: Vec::new(),
            in_flight: 0,
            budget,
        };
        if include_seed && budget > 0 {
            frontier.discovered.insert(seed.to_string());
            frontier.links.push(seed.to_string());
        }
        frontier
    }

    fn is_full(&self) -> bool {
        self.links.len() >= self.budget
    }

    fn next_task(&mut self) -> NextTask {
        loop {
            if self.is_full() {
                return NextTask::Done;
            }
            match self.queue.pop_front() {
                Some(url) => {
                    if !self.visited.insert(url.clone()) {
                        continue;
                    }
                    self.in_flight += 1;
                    return NextTask::Fetch(url);
                }
                None if self.in_flight == 0 => return NextTask::Done,
                None => return NextTask::Wait,
            }
        }
    }

    /// Record links found on one page. Returns how many were new.
    fn accept(&mut self, found: Vec<String>) -> usize {
        let mut accepted = 0;
        for link in found {
            if self.is_full() {
                break;
            }
            if self.visited.contains(&link) || self.discovered.contains(&link) {
                continue;
            }
            self.discovered.insert(link.clone());
            self.queue.push_back(link.clone());
            self.links.push(link);
            accepted += 1;
        }
        accepted
    }
}
