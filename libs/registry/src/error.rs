//! Fetch errors.

use thiserror::Error;

/// Errors from fetching a page of the tag listing.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or body read failure.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("registry returned HTTP {status}")]
    Status { status: u16 },

    /// Body was not a parseable page.
    #[error("malformed page body: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Every attempt allowed by the retry policy failed.
    #[error("page {page} unavailable after {attempts} attempts: {last}")]
    Exhausted {
        page: u32,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Returns true for the terminal "retries used up" variant.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
