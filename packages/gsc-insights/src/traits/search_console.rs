//! Search Console capability consumed by the fetch layer.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    inspection::UrlInspection,
    query::{AnalyticsQuery, PageWindow},
    row::Row,
};

/// One remote call per method; no retries or paging inside implementations.
///
/// Errors must already be normalized into [`crate::InsightsError`] so the
/// retrier and permission fallback can act on them.
#[async_trait]
pub trait SearchConsoleApi: Send + Sync {
    /// Fetch one page of analytics rows for `site_url`.
    async fn query(
        &self,
        site_url: &str,
        query: &AnalyticsQuery,
        window: PageWindow,
    ) -> Result<Vec<Row>>;

    /// Inspect the index status of `url` within `site_url`.
    async fn inspect_url(&self, site_url: &str, url: &str) -> Result<UrlInspection>;
}
