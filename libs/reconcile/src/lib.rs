//! Size reconciliation.
//!
//! Merges three sources into the mapping that gets persisted:
//!
//! - **Fresh**: sizes just aggregated from the registry.
//! - **Expected**: the authoritative id set; it alone decides output membership.
//! - **Prior**: the previously persisted snapshot, used to carry values forward.
//!
//! # Invariants
//!
//! - Output keys are exactly the expected ids
//! - Precedence per id is fresh, then prior, then the unknown sentinel
//! - A value is never invented for an id no source knows about
//! - Reconciling against a snapshot equal to the fresh data is a no-op

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Id -> size in GB.
pub type SizeMap = BTreeMap<String, f64>;

/// Sentinel stored for ids no source knows a size for.
pub const UNKNOWN_SIZE: f64 = 0.0;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Fresh registry aggregation.
    Registry,

    /// Carried forward from the prior snapshot.
    Snapshot,

    /// No source had a value.
    Unknown,
}

/// A resolved value and its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub value: f64,
    pub source: Source,
}

/// Resolve one id against the fresh and prior sources, in that order.
pub fn resolve(id: &str, fresh: &SizeMap, prior: &SizeMap) -> Resolution {
    if let Some(value) = fresh.get(id) {
        return Resolution {
            value: *value,
            source: Source::Registry,
        };
    }

    if let Some(value) = prior.get(id) {
        return Resolution {
            value: *value,
            source: Source::Snapshot,
        };
    }

    Resolution {
        value: UNKNOWN_SIZE,
        source: Source::Unknown,
    }
}

/// Min/max/average/sum over known (positive) sizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub sum: f64,
}

impl SizeSummary {
    /// Summarize the positive values. Returns `None` if there are none.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;

        for value in values.into_iter().filter(|v| *v > 0.0) {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }

        (count > 0).then(|| Self {
            count,
            min,
            max,
            average: sum / count as f64,
            sum,
        })
    }
}

/// Discrepancy statistics for one reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileStats {
    /// Distinct expected ids.
    pub total: usize,

    /// Ids present in the fresh aggregation.
    pub found: usize,

    /// Ids absent from the fresh aggregation, whatever the fallback.
    pub missing: usize,

    /// Missing ids that took their value from the prior snapshot.
    pub carried_forward: usize,

    /// Missing ids, in expected order.
    pub missing_ids: Vec<String>,

    /// Summary over final values > 0.
    pub sizes: Option<SizeSummary>,
}

/// Final mapping plus statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub mapping: SizeMap,
    pub stats: ReconcileStats,
}

/// Reconcile fresh sizes against the expected ids and a prior snapshot.
///
/// Repeated expected ids are counted once. Fresh ids that are not expected
/// are dropped.
pub fn reconcile<'a, I>(fresh: &SizeMap, expected_ids: I, prior: &SizeMap) -> Reconciliation
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = BTreeSet::new();
    let mut mapping = SizeMap::new();
    let mut found = 0;
    let mut carried_forward = 0;
    let mut missing_ids = Vec::new();

    for id in expected_ids {
        if !seen.insert(id) {
            continue;
        }

        let resolution = resolve(id, fresh, prior);
        match resolution.source {
            Source::Registry => found += 1,
            Source::Snapshot => {
                carried_forward += 1;
                missing_ids.push(id.to_string());
            }
            Source::Unknown => missing_ids.push(id.to_string()),
        }

        mapping.insert(id.to_string(), resolution.value);
    }

    let sizes = SizeSummary::from_values(mapping.values().copied());

    Reconciliation {
        stats: ReconcileStats {
            total: seen.len(),
            found,
            missing: missing_ids.len(),
            carried_forward,
            missing_ids,
            sizes,
        },
        mapping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn sizes(pairs: &[(&str, f64)]) -> SizeMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[rstest]
    #[case("a", 5.0, Source::Registry)]
    #[case("b", 3.2, Source::Snapshot)]
    #[case("c", UNKNOWN_SIZE, Source::Unknown)]
    fn test_resolve_precedence(#[case] id: &str, #[case] value: f64, #[case] source: Source) {
        let fresh = sizes(&[("a", 5.0)]);
        let prior = sizes(&[("a", 1.0), ("b", 3.2)]);

        assert_eq!(resolve(id, &fresh, &prior), Resolution { value, source });
    }

    #[test]
    fn test_reconcile_three_way() {
        let fresh = sizes(&[("a", 5.0)]);
        let prior = sizes(&[("b", 3.2)]);

        let result = reconcile(&fresh, ["a", "b", "c"], &prior);

        assert_eq!(result.mapping, sizes(&[("a", 5.0), ("b", 3.2), ("c", 0.0)]));
        assert_eq!(result.stats.total, 3);
        assert_eq!(result.stats.found, 1);
        assert_eq!(result.stats.missing, 2);
        assert_eq!(result.stats.carried_forward, 1);
        assert_eq!(result.stats.missing_ids, vec!["b", "c"]);
    }

    #[test]
    fn test_reconcile_drops_unexpected_ids() {
        let fresh = sizes(&[("a", 5.0), ("stray", 9.9)]);

        let result = reconcile(&fresh, ["a"], &SizeMap::new());

        assert_eq!(result.mapping, sizes(&[("a", 5.0)]));
        assert_eq!(result.stats.missing, 0);
    }

    #[test]
    fn test_reconcile_idempotent_against_matching_snapshot() {
        let fresh = sizes(&[("a", 5.0), ("b", 3.25), ("c", 12.0)]);
        let prior = fresh.clone();

        let result = reconcile(&fresh, fresh.keys().map(String::as_str), &prior);

        assert_eq!(result.mapping, prior);
        assert_eq!(result.stats.missing, 0);
        assert_eq!(result.stats.found, 3);
    }

    #[test]
    fn test_reconcile_counts_repeated_ids_once() {
        let fresh = sizes(&[("a", 5.0)]);

        let result = reconcile(&fresh, ["a", "b", "a", "b"], &SizeMap::new());

        assert_eq!(result.stats.total, 2);
        assert_eq!(result.stats.found, 1);
        assert_eq!(result.stats.missing_ids, vec!["b"]);
    }

    #[test]
    fn test_summary_ignores_unknowns() {
        let fresh = sizes(&[("a", 2.0), ("b", 6.0)]);

        let result = reconcile(&fresh, ["a", "b", "c"], &SizeMap::new());
        let summary = result.stats.sizes.unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 6.0);
        assert_eq!(summary.average, 4.0);
        assert_eq!(summary.sum, 8.0);
    }

    #[test]
    fn test_summary_absent_when_nothing_known() {
        let result = reconcile(&SizeMap::new(), ["a"], &SizeMap::new());
        assert_eq!(result.mapping, sizes(&[("a", 0.0)]));
        assert!(result.stats.sizes.is_none());
    }

    #[test]
    fn test_stats_serialize() {
        let result = reconcile(&sizes(&[("a", 1.5)]), ["a", "z"], &SizeMap::new());
        let json = serde_json::to_value(&result.stats).unwrap();

        assert_eq!(json["found"], 1);
        assert_eq!(json["missing_ids"], serde_json::json!(["z"]));
        assert_eq!(json["sizes"]["sum"], 1.5);
    }

    fn size_map() -> impl Strategy<Value = SizeMap> {
        prop::collection::btree_map("[a-e]{1,2}", 0.0f64..50.0, 0..12)
    }

    proptest! {
        #[test]
        fn prop_output_keys_are_expected_ids(
            fresh in size_map(),
            prior in size_map(),
            expected in prop::collection::vec("[a-e]{1,2}", 0..16),
        ) {
            let result = reconcile(&fresh, expected.iter().map(String::as_str), &prior);

            let keys: BTreeSet<&str> = result.mapping.keys().map(String::as_str).collect();
            let wanted: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
            prop_assert_eq!(keys, wanted);
            prop_assert_eq!(result.stats.found + result.stats.missing, result.stats.total);
        }
    }
}
