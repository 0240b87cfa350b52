//! Row types - one analytics record and its dimension key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A categorical attribute of a performance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Query,
    Page,
    Country,
    Device,
    SearchAppearance,
    Date,
}

impl Dimension {
    /// Name used by the upstream API.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Dimension::Query => "query",
            Dimension::Page => "page",
            Dimension::Country => "country",
            Dimension::Device => "device",
            Dimension::SearchAppearance => "searchAppearance",
            Dimension::Date => "date",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// The dimension tuple identifying a row.
///
/// Ordered by dimension so two keys built from the same values in a
/// different order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionKey(BTreeMap<Dimension, String>);

impl DimensionKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip requested dimensions with the key values returned upstream.
    ///
    /// Extra values on either side are ignored.
    pub fn from_parts(dimensions: &[Dimension], values: &[String]) -> Self {
        Self(
            dimensions
                .iter()
                .copied()
                .zip(values.iter().cloned())
                .collect(),
        )
    }

    /// Add a dimension value.
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.0.insert(dimension, value.into());
        self
    }

    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.0.get(&dimension).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (dimension, value) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", dimension, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Metric set of one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate in [0, 1]
    pub ctr: f64,
    /// Average position, 1-based; 0.0 only for a synthetic zero counterpart
    pub position: f64,
}

impl Metrics {
    /// Build metrics, deriving CTR from clicks and impressions.
    pub fn new(clicks: u64, impressions: u64, position: f64) -> Self {
        let ctr = if impressions == 0 {
            0.0
        } else {
            clicks as f64 / impressions as f64
        };
        Self {
            clicks,
            impressions,
            ctr,
            position,
        }
    }
}

/// One analytics record. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub keys: DimensionKey,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl Row {
    pub fn new(keys: DimensionKey, metrics: Metrics) -> Self {
        Self { keys, metrics }
    }

    pub fn query(&self) -> Option<&str> {
        self.keys.get(Dimension::Query)
    }

    pub fn page(&self) -> Option<&str> {
        self.keys.get(Dimension::Page)
    }
}
