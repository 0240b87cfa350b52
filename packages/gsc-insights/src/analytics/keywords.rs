//! Queries gained and lost between two periods.

use serde::{Deserialize, Serialize};

use super::{group_rows, require_dimension};
use crate::error::Result;
use crate::types::dataset::Dataset;
use crate::types::row::{Dimension, Metrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub query: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordDiff {
    /// Only in the later period, most impressions first.
    pub new: Vec<KeywordEntry>,
    /// Only in the earlier period, with their earlier metrics.
    pub lost: Vec<KeywordEntry>,
}

/// Queries that appeared or disappeared. Queries present in both periods are
/// not reported, whatever their change.
pub fn keyword_diff(earlier: &Dataset, later: &Dataset) -> Result<KeywordDiff> {
    require_dimension(earlier, Dimension::Query, "keyword diff")?;
    require_dimension(later, Dimension::Query, "keyword diff")?;

    let before = group_rows(earlier.rows(), |r| r.query().map(str::to_string));
    let after = group_rows(later.rows(), |r| r.query().map(str::to_string));

    let mut new: Vec<KeywordEntry> = after
        .iter()
        .filter(|(query, _)| !before.contains_key(*query))
        .map(|(query, totals)| KeywordEntry {
            query: query.clone(),
            metrics: totals.metrics(),
        })
        .collect();

    let mut lost: Vec<KeywordEntry> = before
        .iter()
        .filter(|(query, _)| !after.contains_key(*query))
        .map(|(query, totals)| KeywordEntry {
            query: query.clone(),
            metrics: totals.metrics(),
        })
        .collect();

    let by_impressions = |a: &KeywordEntry, b: &KeywordEntry| {
        b.metrics
            .impressions
            .cmp(&a.metrics.impressions)
            .then_with(|| a.query.cmp(&b.query))
    };
    new.sort_by(by_impressions);
    lost.sort_by(by_impressions);

    Ok(KeywordDiff { new, lost })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;

    #[test]
    fn test_new_and_lost_queries() {
        let a = dataset(
            earlier(),
            &[Dimension::Query],
            vec![
                query_row("kept", 10, 100, 2.0),
                query_row("dropped", 4, 40, 6.0),
            ],
        );
        let b = dataset(
            later(),
            &[Dimension::Query],
            vec![
                query_row("kept", 1, 10, 9.0),
                query_row("fresh", 2, 20, 7.0),
                query_row("fresher", 3, 90, 5.0),
            ],
        );

        let diff = keyword_diff(&a, &b).unwrap();
        let new: Vec<_> = diff.new.iter().map(|k| k.query.as_str()).collect();
        assert_eq!(new, vec!["fresher", "fresh"]);
        assert_eq!(diff.lost.len(), 1);
        assert_eq!(diff.lost[0].query, "dropped");
        assert_eq!(diff.lost[0].metrics.clicks, 4);
    }

    #[test]
    fn test_identical_periods_have_empty_diff() {
        let rows = vec![query_row("a", 1, 10, 1.0)];
        let a = dataset(earlier(), &[Dimension::Query], rows.clone());
        let b = dataset(later(), &[Dimension::Query], rows);
        assert_eq!(keyword_diff(&a, &b).unwrap(), KeywordDiff::default());
    }
}
