//! Page fetching with bounded retry.

use std::sync::Arc;

use tracing::{error, warn};

use crate::client::PageSource;
use crate::error::FetchError;
use crate::page::TagPage;
use crate::retry::{RetryPolicy, Sleeper};

/// Fetches pages from a [`PageSource`], retrying failed attempts.
///
/// Any failed attempt (network, timeout, bad status, malformed body) is
/// retried after the policy's delay. Once the policy is used up the last
/// error is returned wrapped in [`FetchError::Exhausted`].
pub struct PageFetcher<S> {
    source: S,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<S: PageSource> PageFetcher<S> {
    /// Create a new page fetcher.
    pub fn new(source: S, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            source,
            policy,
            sleeper,
        }
    }

    /// The sleeper used for backoff; shared with the pagination delay.
    pub fn sleeper(&self) -> &Arc<dyn Sleeper> {
        &self.sleeper
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch one page, retrying per the policy.
    pub async fn fetch(&self, page: u32, page_size: u32) -> Result<TagPage, FetchError> {
        let mut retry = 0;

        loop {
            let err = match self.source.get_page(page, page_size).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if retry >= self.policy.max_retries {
                error!(
                    page,
                    attempts = retry + 1,
                    error = %err,
                    "Giving up on page"
                );
                return Err(FetchError::Exhausted {
                    page,
                    attempts: retry + 1,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay(retry);
            warn!(
                page,
                attempt = retry + 1,
                delay_secs = delay.as_secs_f64(),
                error = %err,
                "Page fetch failed, retrying"
            );
            self.sleeper.sleep(delay).await;
            retry += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// Fails the first `failures` calls with a 503, then succeeds.
    struct Flaky {
        failures: u32,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl PageSource for Flaky {
        async fn get_page(&self, _page: u32, _page_size: u32) -> Result<TagPage, FetchError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.failures {
                Err(FetchError::Status { status: 503 })
            } else {
                Ok(TagPage::default())
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for Recorder {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn fetcher(failures: u32) -> (PageFetcher<Flaky>, Arc<Recorder>) {
        let sleeper = Arc::new(Recorder::default());
        let source = Flaky {
            failures,
            calls: Mutex::new(0),
        };
        (
            PageFetcher::new(source, RetryPolicy::default(), sleeper.clone()),
            sleeper,
        )
    }

    #[tokio::test]
    async fn test_success_without_sleeping() {
        let (fetcher, sleeper) = fetcher(0);
        assert!(fetcher.fetch(1, 100).await.is_ok());
        assert!(sleeper.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backoff_before_fourth_attempt_success() {
        let (fetcher, sleeper) = fetcher(3);

        assert!(fetcher.fetch(1, 100).await.is_ok());
        assert_eq!(*fetcher.source.calls.lock().unwrap(), 4);
        assert_eq!(
            *sleeper.0.lock().unwrap(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_exhausted_after_budget() {
        let (fetcher, sleeper) = fetcher(10);

        let err = fetcher.fetch(7, 100).await.unwrap_err();
        match err {
            FetchError::Exhausted {
                page,
                attempts,
                last,
            } => {
                assert_eq!(page, 7);
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::Status { status: 503 }));
            }
            other => panic!("expected exhausted, got {other:?}"),
        }
        assert_eq!(*fetcher.source.calls.lock().unwrap(), 4);
        assert_eq!(sleeper.0.lock().unwrap().len(), 3);
    }
}
