//! Sync command: crawl, reconcile, rewrite the size snapshot.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use hubsize_reconcile::{reconcile, ReconcileStats, Reconciliation, SizeMap};
use hubsize_registry::{PageSource, PaginationDriver};
use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use crate::dataset::{self, ExpectedEntity};
use crate::output::{
    display_gb, print_info, print_output, print_single, print_success, print_warning,
    OutputFormat,
};

use super::CommandContext;

/// Missing ids listed inline before the table output truncates.
const MISSING_PREVIEW: usize = 20;

/// Sync arguments.
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Expected entities file (JSON array of objects with an `id`).
    #[arg(long)]
    entities: Option<PathBuf>,

    /// Size snapshot to fall back on and overwrite with the result.
    #[arg(long)]
    sizes: Option<PathBuf>,

    /// Crawl and reconcile without writing the snapshot.
    #[arg(long)]
    dry_run: bool,
}

/// Per-run summary.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub repository: String,
    pub generated_at: DateTime<Utc>,

    /// Pages absorbed before the crawl stopped.
    pub pages: u32,

    /// Why the crawl stopped.
    pub stop: String,

    /// True when the crawl stopped on a failed page.
    pub partial: bool,

    /// Tags with a known size in the registry.
    pub tags_fetched: usize,

    pub stats: ReconcileStats,

    /// Where the snapshot was written; `None` on a dry run.
    pub output: Option<PathBuf>,
}

/// Result of one sync: the mapping to persist and its report.
pub struct SyncRun {
    pub mapping: SizeMap,
    pub report: SyncReport,
}

impl SyncCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let entities_path = self
            .entities
            .unwrap_or_else(|| ctx.config.entities_path.clone());
        let sizes_path = self.sizes.unwrap_or_else(|| ctx.config.sizes_path.clone());

        // Output membership comes from here; without it nothing is written
        let expected = dataset::load_expected(&entities_path)?;
        let prior = dataset::load_snapshot(&sizes_path)?;

        let driver = ctx.driver()?;
        info!(
            repository = %ctx.config.repository,
            expected = expected.len(),
            prior = prior.len(),
            "Starting sync"
        );

        let SyncRun {
            mapping,
            mut report,
        } = sync(&driver, &ctx.config.repository, &expected, &prior).await;

        if !self.dry_run {
            dataset::write_snapshot(&sizes_path, &mapping)?;
            report.output = Some(sizes_path);
        }

        print_report(&report, ctx.format);
        Ok(())
    }
}

/// Crawl the registry and reconcile against the expected ids and prior snapshot.
pub async fn sync<S: PageSource>(
    driver: &PaginationDriver<S>,
    repository: &str,
    expected: &[ExpectedEntity],
    prior: &SizeMap,
) -> SyncRun {
    let crawl = driver.crawl().await;

    let Reconciliation { mapping, stats } = reconcile(
        &crawl.sizes,
        expected.iter().map(|entity| entity.id.as_str()),
        prior,
    );

    for id in &stats.missing_ids {
        warn!(id = %id, "Tag not found in registry");
    }
    info!(
        total = stats.total,
        found = stats.found,
        missing = stats.missing,
        carried_forward = stats.carried_forward,
        "Reconciled sizes"
    );

    SyncRun {
        mapping,
        report: SyncReport {
            repository: repository.to_string(),
            generated_at: Utc::now(),
            pages: crawl.pages_absorbed,
            stop: crawl.stop.to_string(),
            partial: crawl.stop.is_failure(),
            tags_fetched: crawl.sizes.len(),
            stats,
            output: None,
        },
    }
}

#[derive(Debug, Serialize, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,

    #[tabled(rename = "Value")]
    value: String,
}

fn row(metric: &'static str, value: impl ToString) -> SummaryRow {
    SummaryRow {
        metric,
        value: value.to_string(),
    }
}

fn summary_rows(report: &SyncReport) -> Vec<SummaryRow> {
    let stats = &report.stats;
    let mut rows = vec![
        row("Repository", &report.repository),
        row("Pages fetched", report.pages),
        row("Stopped because", &report.stop),
        row("Tags in registry", report.tags_fetched),
        row("Total expected", stats.total),
        row("Found in registry", stats.found),
        row("Missing from registry", stats.missing),
        row("Carried forward", stats.carried_forward),
    ];

    if let Some(sizes) = &stats.sizes {
        rows.push(row("Min", display_gb(&sizes.min)));
        rows.push(row("Max", display_gb(&sizes.max)));
        rows.push(row("Average", display_gb(&sizes.average)));
        rows.push(row("Total", display_gb(&sizes.sum)));
    }

    rows
}

fn print_report(report: &SyncReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_single(report);
        return;
    }

    print_output(&summary_rows(report), format);

    let missing = &report.stats.missing_ids;
    if !missing.is_empty() {
        let mut preview = missing
            .iter()
            .take(MISSING_PREVIEW)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if missing.len() > MISSING_PREVIEW {
            preview.push_str(&format!(", ... ({} more)", missing.len() - MISSING_PREVIEW));
        }
        print_warning(&format!("Not in registry: {}", preview));
    }

    if report.partial {
        print_warning("Crawl stopped early; sizes from later pages fell back to the snapshot.");
    }

    match &report.output {
        Some(path) => print_success(&format!(
            "Wrote {} sizes to {}",
            report.stats.total,
            path.display()
        )),
        None => print_info("Dry run: snapshot not written."),
    }
}
