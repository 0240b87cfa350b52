//! Report operations: the public surface.
//!
//! Each report takes an explicit [`InsightsContext`], fetches what it needs
//! through the resilient fetch stack, and hands the datasets to the pure
//! transforms in [`crate::analytics`].

pub mod benchmark;
pub mod cannibalization;
pub mod health;
pub mod inspection;
pub mod trends;

pub use benchmark::{ctr_benchmark, striking_distance};
pub use cannibalization::{detect_cannibalization, resolve_cannibalization};
pub use health::{page_health, PageAnalytics, PageHealthOptions, PageHealthSection};
pub use inspection::batch_inspect;
pub use trends::{compare_periods, detect_decay, drop_alerts, keyword_diff};

use crate::context::InsightsContext;
use crate::error::Result;
use crate::fetch::fetch_dataset;
use crate::types::{dataset::Dataset, period::Period, query::AnalyticsQuery};

/// Fetch the same query shape over two periods concurrently.
pub(crate) async fn fetch_pair(
    ctx: &InsightsContext,
    site_url: &str,
    query: &AnalyticsQuery,
    earlier: Period,
    later: Period,
) -> Result<(Dataset, Dataset)> {
    let earlier_query = query.for_period(earlier);
    let later_query = query.for_period(later);

    tokio::try_join!(
        fetch_dataset(ctx, site_url, &earlier_query),
        fetch_dataset(ctx, site_url, &later_query),
    )
}
