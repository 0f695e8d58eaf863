//! Registry tag crawler.
//!
//! Walks a container registry's paginated tag listing and collects a
//! tag name -> size (GB) mapping. The pieces, leaf first:
//!
//! - **PageSource**: one GET for one page ([`RegistryClient`] over HTTP).
//! - **PageFetcher**: wraps a source with a bounded [`RetryPolicy`].
//! - **TagAggregator**: resolves each record's effective size and accumulates it.
//! - **PaginationDriver**: advances the page cursor until a stop condition.
//!
//! # Invariants
//!
//! - Pages are fetched and absorbed strictly in increasing page order
//! - A tag re-appearing on a later page overwrites the earlier value
//! - Tags with an unknown (zero) size are never stored
//! - Every stop condition returns the partial aggregation

pub mod aggregate;
pub mod client;
pub mod crawl;
pub mod error;
pub mod fetcher;
pub mod page;
pub mod retry;

pub use aggregate::{bytes_to_gb, AggregatedSizes, TagAggregator};
pub use client::{PageSource, RegistryClient, RegistryConfig};
pub use crawl::{CrawlConfig, CrawlOutcome, PaginationDriver, StopReason};
pub use error::FetchError;
pub use fetcher::PageFetcher;
pub use page::{ImageRecord, TagPage, TagRecord};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
