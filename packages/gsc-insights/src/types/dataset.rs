//! Dataset - the complete, ordered result of one paginated fetch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::period::Period;
use super::query::SearchType;
use super::row::{Dimension, DimensionKey, Row};

/// Rows for one period and one query shape, in upstream order.
///
/// Built once by the fetch loop and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    period: Period,
    dimensions: Vec<Dimension>,
    search_type: SearchType,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(
        period: Period,
        dimensions: Vec<Dimension>,
        search_type: SearchType,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            period,
            dimensions,
            search_type,
            rows,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_dimension(&self, dimension: Dimension) -> bool {
        self.dimensions.contains(&dimension)
    }

    pub fn total_clicks(&self) -> u64 {
        self.rows.iter().map(|r| r.metrics.clicks).sum()
    }

    pub fn total_impressions(&self) -> u64 {
        self.rows.iter().map(|r| r.metrics.impressions).sum()
    }

    /// Keys that occur more than once, sorted.
    ///
    /// Pages are never deduplicated, so upstream paging drift shows up here.
    pub fn duplicate_keys(&self) -> Vec<DimensionKey> {
        let mut counts: HashMap<&DimensionKey, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(&row.keys).or_default() += 1;
        }
        let mut duplicates: Vec<DimensionKey> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(k, _)| k.clone())
            .collect();
        duplicates.sort();
        duplicates
    }
}
