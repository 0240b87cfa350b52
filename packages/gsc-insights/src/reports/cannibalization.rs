use tracing::info;

use crate::analytics::{self, CannibalizationGroup, CannibalizationOptions, CannibalizationResolution};
use crate::context::InsightsContext;
use crate::error::Result;
use crate::fetch::fetch_dataset;
use crate::types::{period::Period, query::AnalyticsQuery, row::Dimension};

async fn groups(
    ctx: &InsightsContext,
    site_url: &str,
    period: Period,
    options: &CannibalizationOptions,
) -> Result<Vec<CannibalizationGroup>> {
    let query = AnalyticsQuery::new(period, [Dimension::Query, Dimension::Page]);
    let dataset = fetch_dataset(ctx, site_url, &query).await?;
    analytics::detect_cannibalization(&dataset, options)
}

/// Queries where several of the site's pages compete.
pub async fn detect_cannibalization(
    ctx: &InsightsContext,
    site_url: &str,
    period: Period,
    options: &CannibalizationOptions,
) -> Result<Vec<CannibalizationGroup>> {
    let found = groups(ctx, site_url, period, options).await?;
    info!(site_url, period = %period, groups = found.len(), "Cannibalization detection complete");
    Ok(found)
}

/// Cannibalization groups with a winner and a recommendation per other page.
///
/// Thresholds come from the context's resolution policy.
pub async fn resolve_cannibalization(
    ctx: &InsightsContext,
    site_url: &str,
    period: Period,
    options: &CannibalizationOptions,
) -> Result<Vec<CannibalizationResolution>> {
    ctx.config().resolution.validate()?;
    let found = groups(ctx, site_url, period, options).await?;
    let resolved = analytics::resolve_cannibalization(&found, &ctx.config().resolution)?;
    info!(site_url, period = %period, resolved = resolved.len(), "Cannibalization resolution complete");
    Ok(resolved)
}
