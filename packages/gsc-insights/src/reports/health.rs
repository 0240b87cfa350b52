//! Composite page health report.
//!
//! Four independent sections fetched side by side. A section that fails is
//! reported as failed; the others still come back.

use serde::{Deserialize, Serialize};

use crate::analytics::MetricTotals;
use crate::context::InsightsContext;
use crate::error::Result;
use crate::execution::Aggregator;
use crate::fetch::{fetch_dataset, inspect_url};
use crate::types::{
    experience::{FieldVitals, FormFactor, LabReport, Strategy},
    inspection::UrlInspection,
    outcome::AggregatedReport,
    period::Period,
    query::{AnalyticsQuery, FilterOperator},
    row::{Dimension, Metrics, Row},
};

pub const INSPECTION_SECTION: &str = "inspection";
pub const ANALYTICS_SECTION: &str = "analytics";
pub const SPEED_SECTION: &str = "speed";
pub const VITALS_SECTION: &str = "vitals";

const NO_PAGE_EXPERIENCE: &str = "page experience client not configured (set PAGESPEED_API_KEY)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHealthOptions {
    pub strategy: Strategy,
    pub form_factor: FormFactor,
    /// How many of the page's queries to keep, by clicks.
    pub top_queries: usize,
}

impl Default for PageHealthOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Mobile,
            form_factor: FormFactor::Phone,
            top_queries: 10,
        }
    }
}

/// Search performance of one page over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalytics {
    pub period: Period,
    pub totals: Metrics,
    pub top_queries: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageHealthSection {
    Inspection(UrlInspection),
    Analytics(PageAnalytics),
    Speed(LabReport),
    Vitals(FieldVitals),
}

async fn page_analytics(
    ctx: &InsightsContext,
    site_url: &str,
    page_url: &str,
    period: Period,
    top_queries: usize,
) -> Result<PageAnalytics> {
    let query = AnalyticsQuery::new(period, [Dimension::Query]).with_filter(
        Dimension::Page,
        FilterOperator::Equals,
        page_url,
    );
    let dataset = fetch_dataset(ctx, site_url, &query).await?;

    let mut totals = MetricTotals::default();
    for row in dataset.rows() {
        totals.add(&row.metrics);
    }

    let mut rows = dataset.rows().to_vec();
    rows.sort_by(|a, b| {
        b.metrics
            .clicks
            .cmp(&a.metrics.clicks)
            .then_with(|| a.keys.cmp(&b.keys))
    });
    rows.truncate(top_queries);

    Ok(PageAnalytics {
        period,
        totals: totals.metrics(),
        top_queries: rows,
    })
}

/// Inspection, search analytics, lab speed and field vitals for one page.
///
/// `speed` and `vitals` are `NotConfigured` when the context has no page
/// experience client. No section is required, so this only fails if the
/// report itself cannot be assembled.
pub async fn page_health(
    ctx: &InsightsContext,
    site_url: &str,
    page_url: &str,
    period: Period,
    options: &PageHealthOptions,
) -> Result<AggregatedReport<PageHealthSection>> {
    let experience = ctx.page_experience();
    let strategy = options.strategy;
    let form_factor = options.form_factor;

    let speed = experience.map(|api| async move {
        api.lab_report(page_url, strategy)
            .await
            .map(PageHealthSection::Speed)
    });
    let vitals = experience.map(|api| async move {
        api.field_vitals(page_url, form_factor)
            .await
            .map(PageHealthSection::Vitals)
    });

    Aggregator::new(ctx.config().auth_mode)
        .section(INSPECTION_SECTION, async move {
            inspect_url(ctx, site_url, page_url)
                .await
                .map(PageHealthSection::Inspection)
        })
        .section(ANALYTICS_SECTION, async move {
            page_analytics(ctx, site_url, page_url, period, options.top_queries)
                .await
                .map(PageHealthSection::Analytics)
        })
        .optional_section(SPEED_SECTION, speed, NO_PAGE_EXPERIENCE)
        .optional_section(VITALS_SECTION, vitals, NO_PAGE_EXPERIENCE)
        .run(ctx.config().fan_out)
        .await
}
