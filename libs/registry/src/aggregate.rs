//! Per-tag size aggregation across pages.

use std::collections::BTreeMap;

use tracing::trace;

use crate::page::TagPage;

/// Tag name -> size in GB, rounded to two decimals.
pub type AggregatedSizes = BTreeMap<String, f64>;

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Convert bytes to GB (1024^3), rounded to two decimals. Exact halves round
/// to the even hundredth.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_GB * 100.0).round_ties_even() / 100.0
}

/// Accumulates effective tag sizes page by page.
///
/// Tags without a name or with an effective size of 0 are skipped, so the
/// mapping never holds a zero entry. A repeated tag name overwrites.
#[derive(Debug, Clone, Default)]
pub struct TagAggregator {
    sizes: AggregatedSizes,
}

impl TagAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb every record of a page. Returns the number of records stored.
    pub fn absorb(&mut self, page: &TagPage) -> usize {
        let mut stored = 0;

        for record in &page.results {
            let Some(name) = record.tag_name() else {
                continue;
            };

            let bytes = record.effective_size();
            if bytes == 0 {
                trace!(tag = %name, "Skipping tag with unknown size");
                continue;
            }

            self.sizes.insert(name.to_string(), bytes_to_gb(bytes));
            stored += 1;
        }

        stored
    }

    pub fn sizes(&self) -> &AggregatedSizes {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn into_sizes(self) -> AggregatedSizes {
        self.sizes
    }
}
