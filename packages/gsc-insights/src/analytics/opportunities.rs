//! Striking-distance queries: ranking just off the top with real demand.

use serde::{Deserialize, Serialize};

use super::{group_rows, require_dimension};
use crate::error::{InsightsError, Result};
use crate::types::dataset::Dataset;
use crate::types::row::{Dimension, Metrics};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikingDistanceOptions {
    /// Inclusive.
    pub min_position: f64,
    /// Inclusive.
    pub max_position: f64,
    pub min_impressions: u64,
}

impl StrikingDistanceOptions {
    pub fn validate(&self) -> Result<()> {
        if self.min_position > self.max_position {
            return Err(InsightsError::validation(format!(
                "position window is empty: {} > {}",
                self.min_position, self.max_position
            )));
        }
        Ok(())
    }
}

impl Default for StrikingDistanceOptions {
    fn default() -> Self {
        Self {
            min_position: 4.0,
            max_position: 20.0,
            min_impressions: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikingDistanceQuery {
    pub query: String,
    pub metrics: Metrics,
}

/// Queries whose average position falls inside the window, most impressions
/// first.
pub fn striking_distance(
    dataset: &Dataset,
    options: &StrikingDistanceOptions,
) -> Result<Vec<StrikingDistanceQuery>> {
    require_dimension(dataset, Dimension::Query, "striking distance")?;
    options.validate()?;

    let window = options.min_position..=options.max_position;
    let mut queries: Vec<StrikingDistanceQuery> = group_rows(dataset.rows(), |r| {
        r.query().map(str::to_string)
    })
    .into_iter()
    .map(|(query, totals)| StrikingDistanceQuery {
        query,
        metrics: totals.metrics(),
    })
    .filter(|q| {
        q.metrics.impressions >= options.min_impressions && window.contains(&q.metrics.position)
    })
    .collect();

    queries.sort_by(|a, b| {
        b.metrics
            .impressions
            .cmp(&a.metrics.impressions)
            .then_with(|| a.query.cmp(&b.query))
    });
    Ok(queries)
}
