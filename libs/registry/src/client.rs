//! HTTP client for the registry's tag listing endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;
use crate::page::TagPage;

/// Default registry API root.
pub const DEFAULT_REGISTRY_URL: &str = "https://hub.docker.com/v2/repositories";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A source of tag listing pages.
///
/// One call is one attempt; retrying is the caller's concern.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a single page (1-based).
    async fn get_page(&self, page: u32, page_size: u32) -> Result<TagPage, FetchError>;
}

/// Where and how to reach the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// API root, e.g. `https://hub.docker.com/v2/repositories`.
    pub registry_url: String,

    /// Repository as `namespace/name`.
    pub repository: String,

    /// Bound on a single request, connect through body.
    pub request_timeout: Duration,
}

impl RegistryConfig {
    /// Full URL of the tag listing endpoint.
    pub fn tags_url(&self) -> String {
        format!(
            "{}/{}/tags",
            self.registry_url.trim_end_matches('/'),
            self.repository.trim_matches('/')
        )
    }
}

/// Registry client issuing one GET per page.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    tags_url: String,
}

impl RegistryClient {
    /// Create a new registry client.
    pub fn new(config: &RegistryConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("hubsize/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            tags_url: config.tags_url(),
        })
    }

    /// The tag listing URL this client pages through.
    pub fn tags_url(&self) -> &str {
        &self.tags_url
    }
}

#[async_trait]
impl PageSource for RegistryClient {
    async fn get_page(&self, page: u32, page_size: u32) -> Result<TagPage, FetchError> {
        debug!(url = %self.tags_url, page, page_size, "Fetching tag page");

        let response = self
            .client
            .get(&self.tags_url)
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(page, status = %status, "Tag page request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(registry_url: &str, repository: &str) -> RegistryConfig {
        RegistryConfig {
            registry_url: registry_url.to_string(),
            repository: repository.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[test]
    fn test_tags_url_building() {
        let cfg = config(DEFAULT_REGISTRY_URL, "michadockermisha/backup");
        assert_eq!(
            cfg.tags_url(),
            "https://hub.docker.com/v2/repositories/michadockermisha/backup/tags"
        );
    }

    #[test]
    fn test_tags_url_trims_slashes() {
        let cfg = config("http://localhost:5000/v2/repositories/", "/acme/games/");
        assert_eq!(
            cfg.tags_url(),
            "http://localhost:5000/v2/repositories/acme/games/tags"
        );
    }

    #[test]
    fn test_client_creation() {
        let client = RegistryClient::new(&config(DEFAULT_REGISTRY_URL, "a/b")).unwrap();
        assert!(client.tags_url().ends_with("/a/b/tags"));
    }
}
