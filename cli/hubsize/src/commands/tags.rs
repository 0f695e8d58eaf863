//! Tags command: crawl only, list what the registry reports.

use anyhow::Result;
use clap::Args;
use hubsize_registry::{AggregatedSizes, StopReason};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{display_gb, print_output, print_warning, OutputFormat};

use super::CommandContext;

/// Tags arguments.
#[derive(Debug, Args)]
pub struct TagsCommand {
    /// Sort by size (largest first) instead of by name.
    #[arg(long)]
    by_size: bool,
}

/// One listed tag.
#[derive(Debug, Clone, Serialize, Tabled)]
struct TagRow {
    #[tabled(rename = "Tag")]
    tag: String,

    #[tabled(rename = "Size", display = "display_gb")]
    size_gb: f64,
}

impl TagsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let driver = ctx.driver()?;
        let outcome = driver.crawl().await;

        print_output(&tag_rows(&outcome.sizes, self.by_size), ctx.format);

        if let Some(notice) = incomplete_notice(&outcome.stop, ctx.format) {
            print_warning(&notice);
        }
        Ok(())
    }
}

/// Warning for a listing cut short by a failed page. JSON output stays a
/// single document; the stop reason is already logged.
fn incomplete_notice(stop: &StopReason, format: OutputFormat) -> Option<String> {
    if !stop.is_failure() || format == OutputFormat::Json {
        return None;
    }
    Some(format!("Listing is incomplete: {}", stop))
}

fn tag_rows(sizes: &AggregatedSizes, by_size: bool) -> Vec<TagRow> {
    let mut rows: Vec<_> = sizes
        .iter()
        .map(|(tag, size_gb)| TagRow {
            tag: tag.clone(),
            size_gb: *size_gb,
        })
        .collect();

    if by_size {
        rows.sort_by(|a, b| b.size_gb.total_cmp(&a.size_gb).then_with(|| a.tag.cmp(&b.tag)));
    }

    rows
}
