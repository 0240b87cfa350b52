//! Period-over-period comparison keyed by dimension tuple.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{group_rows, percent_change, MetricTotals};
use crate::types::dataset::Dataset;
use crate::types::period::Period;
use crate::types::row::{DimensionKey, Metrics};

/// One metric in both periods. `delta = later - earlier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub earlier: f64,
    pub later: f64,
    pub delta: f64,
    /// Percent units; `None` when `earlier` is zero.
    pub percent_change: Option<f64>,
}

impl MetricChange {
    pub fn new(earlier: f64, later: f64) -> Self {
        Self {
            earlier,
            later,
            delta: later - earlier,
            percent_change: percent_change(earlier, later),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChanges {
    pub clicks: MetricChange,
    pub impressions: MetricChange,
    pub ctr: MetricChange,
    pub position: MetricChange,
}

impl MetricChanges {
    pub fn between(earlier: &Metrics, later: &Metrics) -> Self {
        Self {
            clicks: MetricChange::new(earlier.clicks as f64, later.clicks as f64),
            impressions: MetricChange::new(earlier.impressions as f64, later.impressions as f64),
            ctr: MetricChange::new(earlier.ctr, later.ctr),
            position: MetricChange::new(earlier.position, later.position),
        }
    }
}

/// Which periods a key appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    EarlierOnly,
    LaterOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyComparison {
    pub key: DimensionKey,
    pub presence: Presence,
    pub changes: MetricChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub earlier_period: Period,
    pub later_period: Period,
    pub totals: MetricChanges,
    /// Sorted by absolute click delta, largest first.
    pub keys: Vec<KeyComparison>,
}

/// Compare two datasets over the union of their keys.
///
/// A key missing from one side is paired with zero metrics. Repeated keys
/// within one dataset are summed.
pub fn compare_periods(earlier: &Dataset, later: &Dataset) -> PeriodComparison {
    let before = group_rows(earlier.rows(), |r| Some(r.keys.clone()));
    let after = group_rows(later.rows(), |r| Some(r.keys.clone()));

    let all_keys: BTreeSet<&DimensionKey> = before.keys().chain(after.keys()).collect();
    let zero = Metrics::default();

    let mut keys: Vec<KeyComparison> = all_keys
        .into_iter()
        .map(|key| {
            let (presence, e, l) = match (before.get(key), after.get(key)) {
                (Some(e), Some(l)) => (Presence::Both, e.metrics(), l.metrics()),
                (Some(e), None) => (Presence::EarlierOnly, e.metrics(), zero),
                (None, Some(l)) => (Presence::LaterOnly, zero, l.metrics()),
                (None, None) => unreachable!("key drawn from one of the two maps"),
            };
            KeyComparison {
                key: key.clone(),
                presence,
                changes: MetricChanges::between(&e, &l),
            }
        })
        .collect();

    keys.sort_by(|a, b| {
        b.changes
            .clicks
            .delta
            .abs()
            .total_cmp(&a.changes.clicks.delta.abs())
            .then_with(|| a.key.cmp(&b.key))
    });

    let total = |dataset: &Dataset| {
        let mut totals = MetricTotals::default();
        for row in dataset.rows() {
            totals.add(&row.metrics);
        }
        totals.metrics()
    };

    PeriodComparison {
        earlier_period: earlier.period(),
        later_period: later.period(),
        totals: MetricChanges::between(&total(earlier), &total(later)),
        keys,
    }
}
