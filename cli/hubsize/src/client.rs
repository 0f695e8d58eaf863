//! Registry crawler construction from config.

use std::sync::Arc;

use hubsize_registry::{PageFetcher, PaginationDriver, RegistryClient, TokioSleeper};

use crate::config::Config;
use crate::error::CliError;

/// Build a driver that crawls the configured repository over HTTP.
pub fn build_driver(config: &Config) -> Result<PaginationDriver<RegistryClient>, CliError> {
    let client = RegistryClient::new(&config.registry_config())?;
    let fetcher = PageFetcher::new(client, config.retry_policy(), Arc::new(TokioSleeper));

    Ok(PaginationDriver::new(fetcher, config.crawl_config()))
}
