//! CLI commands.

mod sync;
mod tags;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hubsize_registry::{PaginationDriver, RegistryClient};

use crate::config::Config;
use crate::output::OutputFormat;

/// hubsize - Sync container image sizes from a registry into a local dataset.
#[derive(Debug, Parser)]
#[command(name = "hubsize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Config file (defaults to config.json in the user config directory).
    #[arg(long, global = true, env = "HUBSIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Registry API root.
    #[arg(long, global = true, env = "HUBSIZE_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Repository to crawl, as namespace/name.
    #[arg(long, global = true, env = "HUBSIZE_REPOSITORY")]
    repository: Option<String>,

    /// Tags requested per page.
    #[arg(long, global = true)]
    page_size: Option<u32>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the registry, reconcile with the dataset, and rewrite the size snapshot.
    Sync(sync::SyncCommand),

    /// Crawl the registry and list tag sizes.
    Tags(tags::TagsCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = OutputFormat::parse(&self.format);

        let mut config = match self.config.as_deref() {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        // Flags (and their env vars) override the config file
        if let Some(registry_url) = self.registry_url {
            config.registry_url = registry_url;
        }
        if let Some(repository) = self.repository {
            config.repository = repository;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        config.validate()?;

        let ctx = CommandContext { config, format };

        match self.command {
            Commands::Sync(cmd) => cmd.run(ctx).await,
            Commands::Tags(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("hubsize {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Get a crawler for the configured repository.
    pub fn driver(&self) -> Result<PaginationDriver<RegistryClient>> {
        Ok(crate::client::build_driver(&self.config)?)
    }
}
