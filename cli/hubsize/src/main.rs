//! hubsize - sync container image sizes into a local dataset
//!
//! Crawls a registry's tag listing, reconciles the sizes against the
//! expected entity ids and the previously written snapshot, and rewrites
//! the snapshot in one step.

use anyhow::Result;
use clap::Parser;

mod client;
mod commands;
mod config;
mod dataset;
mod error;
mod logging;
mod output;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_json());

    // Run the command
    if let Err(e) = cli.run().await {
        // Print error in a user-friendly way
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
