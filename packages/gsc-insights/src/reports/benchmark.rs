//! Single-period opportunity reports.

use tracing::info;

use crate::analytics::{
    self, CtrBenchmarkOptions, CtrBenchmarkRow, CtrCurve, StrikingDistanceOptions,
    StrikingDistanceQuery,
};
use crate::context::InsightsContext;
use crate::error::Result;
use crate::fetch::fetch_dataset;
use crate::types::{period::Period, query::AnalyticsQuery, row::Dimension};

/// Rows of `query` whose CTR falls short of `curve`.
pub async fn ctr_benchmark(
    ctx: &InsightsContext,
    site_url: &str,
    query: &AnalyticsQuery,
    curve: &CtrCurve,
    options: &CtrBenchmarkOptions,
) -> Result<Vec<CtrBenchmarkRow>> {
    curve.validate()?;
    options.validate()?;
    let dataset = fetch_dataset(ctx, site_url, query).await?;
    let flagged = analytics::ctr_benchmark(&dataset, curve, options)?;

    info!(
        site_url,
        rows = dataset.len(),
        flagged = flagged.len(),
        "CTR benchmark complete"
    );
    Ok(flagged)
}

pub async fn striking_distance(
    ctx: &InsightsContext,
    site_url: &str,
    period: Period,
    options: &StrikingDistanceOptions,
) -> Result<Vec<StrikingDistanceQuery>> {
    options.validate()?;
    let query = AnalyticsQuery::new(period, [Dimension::Query]);
    let dataset = fetch_dataset(ctx, site_url, &query).await?;
    let found = analytics::striking_distance(&dataset, options)?;

    info!(site_url, queries = found.len(), "Striking distance complete");
    Ok(found)
}
