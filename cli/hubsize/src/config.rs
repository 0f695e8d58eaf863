//! Configuration.
//!
//! Handles:
//! - Registry endpoint and repository
//! - Dataset file locations
//! - Pagination and retry tuning
//!
//! Values come from `config.json` in the user config directory when present,
//! then command-line flags (or their environment variables) override them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use hubsize_registry::client::{DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT};
use hubsize_registry::crawl::{DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE};
use hubsize_registry::retry::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES};
use hubsize_registry::{CrawlConfig, RegistryConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "hubsize", "hubsize")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// hubsize configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Registry API root.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Repository as `namespace/name`.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Expected entities (JSON array of objects with an `id`).
    #[serde(default = "default_entities_path")]
    pub entities_path: PathBuf,

    /// Size snapshot, read as the prior and rewritten with the result.
    #[serde(default = "default_sizes_path")]
    pub sizes_path: PathBuf,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_repository() -> String {
    "michadockermisha/backup".to_string()
}

fn default_entities_path() -> PathBuf {
    PathBuf::from("public/data/games.json")
}

fn default_sizes_path() -> PathBuf {
    PathBuf::from("public/data/image-sizes.json")
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_page_delay_ms() -> u64 {
    DEFAULT_PAGE_DELAY.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_base_secs() -> u64 {
    DEFAULT_BACKOFF_BASE.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            repository: default_repository(),
            entities_path: default_entities_path(),
            sizes_path: default_sizes_path(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
        }
    }
}

impl Config {
    /// Load config from the user config directory, or return default.
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Reject settings the crawler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }
        if self.repository.trim_matches('/').is_empty() {
            anyhow::bail!("repository must be set as namespace/name");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            registry_url: self.registry_url.clone(),
            repository: self.repository.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base: Duration::from_secs(self.backoff_base_secs),
        }
    }

    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            page_size: self.page_size,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }
}
