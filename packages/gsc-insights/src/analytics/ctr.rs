//! CTR benchmarking against a position → expected-CTR curve.

use serde::{Deserialize, Serialize};

use super::group_rows;
use crate::error::{InsightsError, Result};
use crate::types::dataset::Dataset;
use crate::types::row::DimensionKey;

/// Expected CTR by rounded position.
///
/// `by_position[0]` is position 1. Positions past the end of the table use
/// `tail`. The curve never increases with position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtrCurve {
    by_position: Vec<f64>,
    tail: f64,
}

impl Default for CtrCurve {
    fn default() -> Self {
        Self {
            by_position: vec![0.317, 0.247, 0.187, 0.136, 0.095, 0.062, 0.042, 0.031, 0.030, 0.026],
            tail: 0.01,
        }
    }
}

impl CtrCurve {
    pub fn new(by_position: Vec<f64>, tail: f64) -> Result<Self> {
        let curve = Self { by_position, tail };
        curve.validate()?;
        Ok(curve)
    }

    pub fn validate(&self) -> Result<()> {
        if self.by_position.is_empty() {
            return Err(InsightsError::validation("CTR curve needs at least one position"));
        }
        let values = self.by_position.iter().chain(std::iter::once(&self.tail));
        if values.clone().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(InsightsError::validation("CTR curve values must lie in [0, 1]"));
        }
        let values: Vec<f64> = values.copied().collect();
        if values.windows(2).any(|w| w[1] > w[0]) {
            return Err(InsightsError::validation(
                "CTR curve must not increase with position",
            ));
        }
        Ok(())
    }

    /// Expected CTR at `position`, rounded to the nearest whole rank.
    pub fn expected(&self, position: f64) -> f64 {
        let rank = position.round().max(1.0) as usize;
        self.by_position.get(rank - 1).copied().unwrap_or(self.tail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CtrBenchmarkOptions {
    /// Flag rows whose CTR falls this fraction or more below expectation.
    pub shortfall_threshold: f64,
    pub min_impressions: u64,
}

impl CtrBenchmarkOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.shortfall_threshold) {
            return Err(InsightsError::validation(format!(
                "shortfall threshold must lie in [0, 1], got {}",
                self.shortfall_threshold
            )));
        }
        Ok(())
    }
}

impl Default for CtrBenchmarkOptions {
    fn default() -> Self {
        Self {
            shortfall_threshold: 0.3,
            min_impressions: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtrBenchmarkRow {
    pub key: DimensionKey,
    pub clicks: u64,
    pub impressions: u64,
    pub position: f64,
    pub actual_ctr: f64,
    pub expected_ctr: f64,
    /// `1 - actual / expected`.
    pub shortfall: f64,
    pub estimated_missed_clicks: f64,
}

/// Rows underperforming the curve for their position.
///
/// Sorted by estimated missed clicks, largest first, ties by key.
pub fn ctr_benchmark(
    dataset: &Dataset,
    curve: &CtrCurve,
    options: &CtrBenchmarkOptions,
) -> Result<Vec<CtrBenchmarkRow>> {
    curve.validate()?;
    options.validate()?;

    let grouped = group_rows(dataset.rows(), |r| Some(r.keys.clone()));

    let mut flagged: Vec<CtrBenchmarkRow> = grouped
        .into_iter()
        .filter_map(|(key, totals)| {
            let m = totals.metrics();
            if m.impressions < options.min_impressions {
                return None;
            }
            let expected_ctr = curve.expected(m.position);
            if expected_ctr <= 0.0 || m.ctr >= expected_ctr * (1.0 - options.shortfall_threshold) {
                return None;
            }
            Some(CtrBenchmarkRow {
                key,
                clicks: m.clicks,
                impressions: m.impressions,
                position: m.position,
                actual_ctr: m.ctr,
                expected_ctr,
                shortfall: 1.0 - m.ctr / expected_ctr,
                estimated_missed_clicks: (expected_ctr - m.ctr) * m.impressions as f64,
            })
        })
        .collect();

    flagged.sort_by(|a, b| {
        b.estimated_missed_clicks
            .total_cmp(&a.estimated_missed_clicks)
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(flagged)
}
