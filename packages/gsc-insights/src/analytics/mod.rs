//! Computed analytics engine.
//!
//! Stateless transforms over already-fetched datasets. Same input, same
//! output: no network, no clock. Every transform sorts its output with a
//! deterministic tie-break.

pub mod cannibalization;
pub mod compare;
pub mod ctr;
pub mod decay;
pub mod keywords;
pub mod opportunities;

pub use cannibalization::{
    detect_cannibalization, recommend, resolve_cannibalization, CannibalizationGroup,
    CannibalizationOptions, CannibalizationResolution, CannibalizationSort, PageResolution,
    PageShare, Recommendation,
};
pub use compare::{compare_periods, KeyComparison, MetricChange, MetricChanges, PeriodComparison, Presence};
pub use ctr::{ctr_benchmark, CtrBenchmarkOptions, CtrBenchmarkRow, CtrCurve};
pub use decay::{detect_decay, drop_alerts, DecayOptions, DecaySignal, DropAlertOptions};
pub use keywords::{keyword_diff, KeywordDiff, KeywordEntry};
pub use opportunities::{striking_distance, StrikingDistanceOptions, StrikingDistanceQuery};

use std::collections::BTreeMap;

use crate::error::{InsightsError, Result};
use crate::types::dataset::Dataset;
use crate::types::row::{Dimension, Metrics, Row};

/// Percent change from `earlier` to `later`, in percent units.
///
/// `None` when `earlier` is zero: the change is undefined, not infinite.
pub fn percent_change(earlier: f64, later: f64) -> Option<f64> {
    if earlier == 0.0 {
        None
    } else {
        Some((later - earlier) * 100.0 / earlier)
    }
}

/// Running sum of several rows' metrics.
///
/// Position is impression-weighted; rows without impressions fall back to a
/// plain mean.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MetricTotals {
    clicks: u64,
    impressions: u64,
    weighted_position: f64,
    position_sum: f64,
    rows: usize,
}

impl MetricTotals {
    pub(crate) fn add(&mut self, metrics: &Metrics) {
        self.clicks += metrics.clicks;
        self.impressions += metrics.impressions;
        self.weighted_position += metrics.position * metrics.impressions as f64;
        self.position_sum += metrics.position;
        self.rows += 1;
    }

    pub(crate) fn metrics(&self) -> Metrics {
        let position = if self.impressions > 0 {
            self.weighted_position / self.impressions as f64
        } else if self.rows > 0 {
            self.position_sum / self.rows as f64
        } else {
            0.0
        };
        Metrics::new(self.clicks, self.impressions, position)
    }
}

/// Sum rows by a key derived from each row; rows yielding `None` are skipped.
pub(crate) fn group_rows<K, F>(rows: &[Row], key_of: F) -> BTreeMap<K, MetricTotals>
where
    K: Ord,
    F: Fn(&Row) -> Option<K>,
{
    let mut groups: BTreeMap<K, MetricTotals> = BTreeMap::new();
    for row in rows {
        if let Some(key) = key_of(row) {
            groups.entry(key).or_default().add(&row.metrics);
        }
    }
    groups
}

pub(crate) fn require_dimension(dataset: &Dataset, dimension: Dimension, transform: &str) -> Result<()> {
    if dataset.has_dimension(dimension) {
        Ok(())
    } else {
        Err(InsightsError::validation(format!(
            "{} needs rows broken down by {}",
            transform, dimension
        )))
    }
}
