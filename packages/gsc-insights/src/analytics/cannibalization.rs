//! Keyword cannibalization: one query, several competing pages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{require_dimension, MetricTotals};
use crate::error::Result;
use crate::types::config::ResolutionPolicy;
use crate::types::dataset::Dataset;
use crate::types::row::Dimension;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CannibalizationSort {
    /// Widest spread of positions first.
    Variance,
    #[default]
    Impressions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannibalizationOptions {
    pub sort: CannibalizationSort,
    /// Pages below this many impressions for the query don't compete.
    /// Values under 1 are treated as 1.
    pub min_impressions: u64,
}

impl Default for CannibalizationOptions {
    fn default() -> Self {
        Self {
            sort: CannibalizationSort::default(),
            min_impressions: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageShare {
    pub page: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    /// Impression-weighted across this page's rows for the query.
    pub average_position: f64,
    /// Share of the group's clicks, in `[0, 1]`.
    pub click_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannibalizationGroup {
    pub query: String,
    /// Most clicks first, ties by page.
    pub pages: Vec<PageShare>,
    pub total_clicks: u64,
    pub total_impressions: u64,
    /// Population variance of the pages' average positions.
    pub position_variance: f64,
}

/// Queries for which two or more pages received impressions.
pub fn detect_cannibalization(
    dataset: &Dataset,
    options: &CannibalizationOptions,
) -> Result<Vec<CannibalizationGroup>> {
    require_dimension(dataset, Dimension::Query, "cannibalization detection")?;
    require_dimension(dataset, Dimension::Page, "cannibalization detection")?;

    let min_impressions = options.min_impressions.max(1);

    let mut by_query: BTreeMap<&str, BTreeMap<&str, MetricTotals>> = BTreeMap::new();
    for row in dataset.rows() {
        if let (Some(query), Some(page)) = (row.query(), row.page()) {
            by_query
                .entry(query)
                .or_default()
                .entry(page)
                .or_default()
                .add(&row.metrics);
        }
    }

    let mut groups: Vec<CannibalizationGroup> = by_query
        .into_iter()
        .filter_map(|(query, pages)| {
            let competing: Vec<(&str, _)> = pages
                .into_iter()
                .map(|(page, totals)| (page, totals.metrics()))
                .filter(|(_, m)| m.impressions >= min_impressions)
                .collect();

            if competing.len() < 2 {
                return None;
            }

            let total_clicks: u64 = competing.iter().map(|(_, m)| m.clicks).sum();
            let total_impressions: u64 = competing.iter().map(|(_, m)| m.impressions).sum();
            let positions: Vec<f64> = competing.iter().map(|(_, m)| m.position).collect();

            let mut pages: Vec<PageShare> = competing
                .into_iter()
                .map(|(page, m)| PageShare {
                    page: page.to_string(),
                    clicks: m.clicks,
                    impressions: m.impressions,
                    ctr: m.ctr,
                    average_position: m.position,
                    click_share: if total_clicks > 0 {
                        m.clicks as f64 / total_clicks as f64
                    } else {
                        0.0
                    },
                })
                .collect();
            pages.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.page.cmp(&b.page)));

            Some(CannibalizationGroup {
                query: query.to_string(),
                pages,
                total_clicks,
                total_impressions,
                position_variance: population_variance(&positions),
            })
        })
        .collect();

    match options.sort {
        CannibalizationSort::Variance => groups.sort_by(|a, b| {
            b.position_variance
                .total_cmp(&a.position_variance)
                .then_with(|| a.query.cmp(&b.query))
        }),
        CannibalizationSort::Impressions => groups.sort_by(|a, b| {
            b.total_impressions
                .cmp(&a.total_impressions)
                .then_with(|| a.query.cmp(&b.query))
        }),
    }

    Ok(groups)
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Too little traffic to stand alone; 301 it to the winner.
    Redirect,
    /// Merge its content into the winner.
    Consolidate,
    /// Strong enough to keep; retarget it at a different intent.
    Differentiate,
}

/// Map a page's click ratio to the winner onto an action.
pub fn recommend(ratio: f64, policy: &ResolutionPolicy) -> Recommendation {
    if ratio < policy.redirect_below {
        Recommendation::Redirect
    } else if ratio >= policy.differentiate_from {
        Recommendation::Differentiate
    } else {
        Recommendation::Consolidate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResolution {
    pub page: String,
    pub click_share: f64,
    pub ratio_to_winner: f64,
    pub action: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannibalizationResolution {
    pub query: String,
    pub winner: PageShare,
    pub others: Vec<PageResolution>,
}

/// Pick a winning page per group and recommend an action for the rest.
///
/// The winner has the highest click share; ties go to impressions, then to
/// the lexically smaller page. When the winner has no clicks at all, ratios
/// fall back to impressions. Group order is preserved.
pub fn resolve_cannibalization(
    groups: &[CannibalizationGroup],
    policy: &ResolutionPolicy,
) -> Result<Vec<CannibalizationResolution>> {
    policy.validate()?;

    Ok(groups
        .iter()
        .filter_map(|group| {
            let mut pages = group.pages.clone();
            pages.sort_by(|a, b| {
                b.click_share
                    .total_cmp(&a.click_share)
                    .then_with(|| b.impressions.cmp(&a.impressions))
                    .then_with(|| a.page.cmp(&b.page))
            });

            let mut pages = pages.into_iter();
            let winner = pages.next()?;

            let others = pages
                .map(|page| {
                    let ratio = if winner.clicks > 0 {
                        page.clicks as f64 / winner.clicks as f64
                    } else if winner.impressions > 0 {
                        page.impressions as f64 / winner.impressions as f64
                    } else {
                        0.0
                    };
                    PageResolution {
                        action: recommend(ratio, policy),
                        page: page.page,
                        click_share: page.click_share,
                        ratio_to_winner: ratio,
                    }
                })
                .collect();

            Some(CannibalizationResolution {
                query: group.query.clone(),
                winner,
                others,
            })
        })
        .collect())
}
