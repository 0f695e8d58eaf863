//! Pagination driver.
//!
//! ```text
//! page = 1
//! loop:
//!   fetch(page)        -- exhausted retries  => Failed
//!   results empty?     -- yes                => Exhausted
//!   absorb(page)
//!   next truthy?       -- no                 => NoNext
//!   sleep(page_delay); page += 1
//! ```
//!
//! Every stop returns what was aggregated so far.

use std::time::Duration;

use tracing::{info, warn};

use crate::aggregate::{AggregatedSizes, TagAggregator};
use crate::client::PageSource;
use crate::error::FetchError;
use crate::fetcher::PageFetcher;

/// Default records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default fixed pause between pages.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Pagination settings, fixed for the life of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub page_size: u32,
    pub page_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Why a crawl stopped. None of these is an error for the caller.
#[derive(Debug)]
pub enum StopReason {
    /// A page stayed unavailable after all retries.
    Failed { page: u32, error: FetchError },

    /// A page came back with no records.
    Exhausted { page: u32 },

    /// The last absorbed page had no continuation.
    NoNext { page: u32 },
}

impl StopReason {
    /// The page number the crawl stopped on.
    pub fn page(&self) -> u32 {
        match self {
            Self::Failed { page, .. } | Self::Exhausted { page } | Self::NoNext { page } => *page,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { page, error } => write!(f, "page {page} failed: {error}"),
            Self::Exhausted { page } => write!(f, "page {page} was empty"),
            Self::NoNext { page } => write!(f, "page {page} was the last page"),
        }
    }
}

/// Result of a crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Tag name -> GB for every tag with a known size.
    pub sizes: AggregatedSizes,

    /// Pages whose records were absorbed.
    pub pages_absorbed: u32,

    pub stop: StopReason,
}

/// Drives a [`PageFetcher`] through the listing, feeding a [`TagAggregator`].
pub struct PaginationDriver<S> {
    fetcher: PageFetcher<S>,
    config: CrawlConfig,
}

impl<S: PageSource> PaginationDriver<S> {
    /// Create a new pagination driver.
    pub fn new(fetcher: PageFetcher<S>, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &PageFetcher<S> {
        &self.fetcher
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Walk the listing from page 1 until a stop condition.
    pub async fn crawl(&self) -> CrawlOutcome {
        let mut aggregator = TagAggregator::new();
        let mut pages_absorbed = 0;
        let mut page = 1;

        let stop = loop {
            let body = match self.fetcher.fetch(page, self.config.page_size).await {
                Ok(body) => body,
                Err(error) => {
                    warn!(
                        page,
                        tags = aggregator.len(),
                        error = %error,
                        "Stopping pagination with partial results"
                    );
                    break StopReason::Failed { page, error };
                }
            };

            if body.is_empty() {
                break StopReason::Exhausted { page };
            }

            let stored = aggregator.absorb(&body);
            pages_absorbed += 1;
            info!(
                page,
                records = body.results.len(),
                stored,
                total = aggregator.len(),
                "Absorbed tag page"
            );

            if !body.has_next() {
                break StopReason::NoNext { page };
            }

            self.fetcher.sleeper().sleep(self.config.page_delay).await;
            page += 1;
        };

        info!(
            pages = pages_absorbed,
            tags = aggregator.len(),
            stop = %stop,
            "Crawl finished"
        );

        CrawlOutcome {
            sizes: aggregator.into_sizes(),
            pages_absorbed,
            stop,
        }
    }
}
