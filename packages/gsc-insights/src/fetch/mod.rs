//! Resilient data acquisition.
//!
//! Every physical call goes through the same stack: the permission fallback
//! outermost, the backoff retrier inside it, and for analytics the paginator
//! around both.

pub mod paginate;
pub mod permission;
pub mod retry;

pub use paginate::{fetch_all_pages, ROW_CEILING};
pub use permission::{to_domain_property, with_permission_fallback, DOMAIN_PROPERTY_PREFIX};
pub use retry::{backoff_delay, with_retry};

use tracing::info;

use crate::context::InsightsContext;
use crate::error::Result;
use crate::types::{
    dataset::Dataset, inspection::UrlInspection, query::AnalyticsQuery, row::Row,
};

/// Fetch the complete dataset for `query`, paging past the row ceiling.
///
/// `query.max_rows` overrides the configured row cap.
pub async fn fetch_dataset(
    ctx: &InsightsContext,
    site_url: &str,
    query: &AnalyticsQuery,
) -> Result<Dataset> {
    let mut pagination = ctx.config().pagination;
    if let Some(max_rows) = query.max_rows {
        pagination.max_rows = max_rows;
    }
    let retry = ctx.config().retry;
    let api = ctx.search_console();

    let rows: Vec<Row> = fetch_all_pages(&pagination, |window| {
        with_permission_fallback(site_url, move |site| async move {
            with_retry(&retry, || api.query(&site, query, window)).await
        })
    })
    .await?;

    info!(
        site_url,
        period = %query.period,
        rows = rows.len(),
        "Fetched dataset"
    );

    Ok(Dataset::new(
        query.period,
        query.dimensions.clone(),
        query.search_type,
        rows,
    ))
}

/// Inspect one URL with retry and permission fallback.
pub async fn inspect_url(ctx: &InsightsContext, site_url: &str, url: &str) -> Result<UrlInspection> {
    let retry = ctx.config().retry;
    let api = ctx.search_console();

    with_permission_fallback(site_url, move |site| async move {
        with_retry(&retry, || api.inspect_url(&site, url)).await
    })
    .await
}
