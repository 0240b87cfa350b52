//! Two-period trend reports.

use tracing::info;

use super::fetch_pair;
use crate::analytics::{self, DecayOptions, DecaySignal, DropAlertOptions, KeywordDiff, PeriodComparison};
use crate::context::InsightsContext;
use crate::error::Result;
use crate::types::{period::Period, query::AnalyticsQuery, row::Dimension};

/// Compare `query`'s shape between two periods.
///
/// `query.period` is ignored; `earlier` and `later` replace it.
pub async fn compare_periods(
    ctx: &InsightsContext,
    site_url: &str,
    query: &AnalyticsQuery,
    earlier: Period,
    later: Period,
) -> Result<PeriodComparison> {
    let (before, after) = fetch_pair(ctx, site_url, query, earlier, later).await?;
    let comparison = analytics::compare_periods(&before, &after);

    info!(
        site_url,
        earlier = %earlier,
        later = %later,
        keys = comparison.keys.len(),
        click_delta = comparison.totals.clicks.delta,
        "Period comparison complete"
    );
    Ok(comparison)
}

/// Pages that lost clicks from `earlier` to `recent`.
pub async fn detect_decay(
    ctx: &InsightsContext,
    site_url: &str,
    earlier: Period,
    recent: Period,
    options: &DecayOptions,
) -> Result<Vec<DecaySignal>> {
    let query = AnalyticsQuery::new(recent, [Dimension::Page]);
    let (before, after) = fetch_pair(ctx, site_url, &query, earlier, recent).await?;
    let signals = analytics::detect_decay(&before, &after, options)?;

    info!(site_url, decaying_pages = signals.len(), "Decay detection complete");
    Ok(signals)
}

/// Pages whose click loss crosses the alert threshold.
pub async fn drop_alerts(
    ctx: &InsightsContext,
    site_url: &str,
    earlier: Period,
    recent: Period,
    options: &DropAlertOptions,
) -> Result<Vec<DecaySignal>> {
    options.validate()?;
    let query = AnalyticsQuery::new(recent, [Dimension::Page]);
    let (before, after) = fetch_pair(ctx, site_url, &query, earlier, recent).await?;
    let alerts = analytics::drop_alerts(&before, &after, options)?;

    info!(
        site_url,
        threshold_percent = options.threshold_percent,
        alerts = alerts.len(),
        "Drop alerts complete"
    );
    Ok(alerts)
}

/// Queries gained and lost between two periods.
pub async fn keyword_diff(
    ctx: &InsightsContext,
    site_url: &str,
    earlier: Period,
    later: Period,
) -> Result<KeywordDiff> {
    let query = AnalyticsQuery::new(later, [Dimension::Query]);
    let (before, after) = fetch_pair(ctx, site_url, &query, earlier, later).await?;
    let diff = analytics::keyword_diff(&before, &after)?;

    info!(
        site_url,
        new = diff.new.len(),
        lost = diff.lost.len(),
        "Keyword diff complete"
    );
    Ok(diff)
}
