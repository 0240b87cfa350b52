//! Google-backed implementations of [`SearchConsoleApi`] and
//! [`PageExperienceApi`].

use async_trait::async_trait;
use search_console_client::{
    self as gsc, ApiRow, CruxRecord, InspectionResult, PageSpeedClient, PageSpeedResponse,
    SearchAnalyticsRequest, SearchConsoleClient,
};
use std::collections::BTreeMap;

use crate::error::{InsightsError, Result};
use crate::traits::{page_experience::PageExperienceApi, search_console::SearchConsoleApi};
use crate::types::{
    experience::{FieldVitals, FormFactor, LabReport, Strategy},
    inspection::UrlInspection,
    query::{AnalyticsQuery, PageWindow},
    row::{Dimension, DimensionKey, Metrics, Row},
};

/// Lighthouse audits surfaced in [`LabReport::metrics`].
const LAB_AUDITS: &[&str] = &[
    "first-contentful-paint",
    "largest-contentful-paint",
    "total-blocking-time",
    "cumulative-layout-shift",
    "speed-index",
    "interactive",
];

fn wire_u32(value: usize, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        InsightsError::validation(format!("{} {} exceeds the API's 32-bit limit", field, value))
    })
}

pub(crate) fn to_request(query: &AnalyticsQuery, window: PageWindow) -> Result<SearchAnalyticsRequest> {
    let filters: Vec<gsc::DimensionFilter> = query
        .filters
        .iter()
        .map(|f| gsc::DimensionFilter {
            dimension: f.dimension.as_api_str().to_string(),
            operator: f.operator.as_api_str().to_string(),
            expression: f.expression.clone(),
        })
        .collect();

    Ok(SearchAnalyticsRequest {
        start_date: query.period.start().to_string(),
        end_date: query.period.end().to_string(),
        dimensions: query
            .dimensions
            .iter()
            .map(|d| d.as_api_str().to_string())
            .collect(),
        search_type: Some(query.search_type.as_api_str().to_string()),
        dimension_filter_groups: if filters.is_empty() {
            vec![]
        } else {
            vec![gsc::DimensionFilterGroup {
                group_type: "and".to_string(),
                filters,
            }]
        },
        data_state: Some(query.data_state.as_api_str().to_string()),
        row_limit: wire_u32(window.row_limit, "rowLimit")?,
        start_row: wire_u32(window.start_row, "startRow")?,
    })
}

pub(crate) fn to_row(dimensions: &[Dimension], row: ApiRow) -> Row {
    Row::new(
        DimensionKey::from_parts(dimensions, &row.keys),
        Metrics {
            clicks: row.clicks.max(0.0).round() as u64,
            impressions: row.impressions.max(0.0).round() as u64,
            ctr: row.ctr,
            position: row.position,
        },
    )
}

pub(crate) fn to_inspection(url: &str, result: InspectionResult) -> UrlInspection {
    let mut inspection = UrlInspection::new(url);
    inspection.inspection_link = result.inspection_result_link;
    if let Some(status) = result.index_status_result {
        inspection.verdict = status.verdict;
        inspection.coverage_state = status.coverage_state;
        inspection.indexing_state = status.indexing_state;
        inspection.robots_txt_state = status.robots_txt_state;
        inspection.page_fetch_state = status.page_fetch_state;
        inspection.last_crawl_time = status.last_crawl_time;
        inspection.google_canonical = status.google_canonical;
        inspection.user_canonical = status.user_canonical;
    }
    inspection
}

pub(crate) fn to_lab_report(url: &str, strategy: Strategy, response: PageSpeedResponse) -> LabReport {
    let mut report = LabReport {
        url: url.to_string(),
        strategy,
        performance_score: None,
        metrics: BTreeMap::new(),
    };

    if let Some(lighthouse) = response.lighthouse_result {
        report.performance_score = lighthouse
            .categories
            .get("performance")
            .and_then(|c| c.score)
            .map(|s| s * 100.0);
        for audit in LAB_AUDITS {
            if let Some(value) = lighthouse.audits.get(*audit).and_then(|a| a.numeric_value) {
                report.metrics.insert(audit.to_string(), value);
            }
        }
    }
    report
}

pub(crate) fn to_field_vitals(url: &str, record: &CruxRecord) -> FieldVitals {
    let p75 = |metric: &str| {
        record
            .metrics
            .get(metric)
            .and_then(|m| m.percentiles.as_ref())
            .and_then(|p| p.p75_f64())
    };

    FieldVitals {
        url: url.to_string(),
        lcp_ms: p75("largest_contentful_paint"),
        inp_ms: p75("interaction_to_next_paint"),
        cls: p75("cumulative_layout_shift"),
        fcp_ms: p75("first_contentful_paint"),
        ttfb_ms: p75("experimental_time_to_first_byte"),
    }
}

#[async_trait]
impl SearchConsoleApi for SearchConsoleClient {
    async fn query(&self, site_url: &str, query: &AnalyticsQuery, window: PageWindow) -> Result<Vec<Row>> {
        let request = to_request(query, window)?;
        let rows = self.query_search_analytics(site_url, &request).await?;
        Ok(rows
            .into_iter()
            .map(|row| to_row(&query.dimensions, row))
            .collect())
    }

    async fn inspect_url(&self, site_url: &str, url: &str) -> Result<UrlInspection> {
        let result = SearchConsoleClient::inspect_url(self, site_url, url).await?;
        Ok(to_inspection(url, result))
    }
}

#[async_trait]
impl PageExperienceApi for PageSpeedClient {
    async fn lab_report(&self, url: &str, strategy: Strategy) -> Result<LabReport> {
        let response = self.run_pagespeed(url, strategy.as_api_str()).await?;
        Ok(to_lab_report(url, strategy, response))
    }

    async fn field_vitals(&self, url: &str, form_factor: FormFactor) -> Result<FieldVitals> {
        let record = self.query_crux(url, form_factor.as_api_str()).await?;
        Ok(to_field_vitals(url, &record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::period::Period;
    use crate::types::query::FilterOperator;

    #[test]
    fn test_request_shape() {
        let query = AnalyticsQuery::new(
            Period::parse("2024-01-01", "2024-01-28").unwrap(),
            [Dimension::Query, Dimension::Page],
        )
        .with_filter(Dimension::Country, FilterOperator::Equals, "usa");

        let request = to_request(&query, PageWindow { row_limit: 25_000, start_row: 50_000 }).unwrap();
        assert_eq!(request.start_date, "2024-01-01");
        assert_eq!(request.end_date, "2024-01-28");
        assert_eq!(request.dimensions, vec!["query", "page"]);
        assert_eq!(request.search_type.as_deref(), Some("web"));
        assert_eq!(request.row_limit, 25_000);
        assert_eq!(request.start_row, 50_000);
        assert_eq!(request.dimension_filter_groups[0].filters[0].dimension, "country");
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_window_rejected() {
        let query = AnalyticsQuery::new(
            Period::parse("2024-01-01", "2024-01-28").unwrap(),
            [Dimension::Query],
        );
        let window = PageWindow {
            row_limit: 25_000,
            start_row: u32::MAX as usize + 1,
        };

        let err = to_request(&query, window).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert!(err.message.contains("startRow"));
    }

    #[test]
    fn test_row_keys_follow_requested_dimensions() {
        let row = to_row(
            &[Dimension::Query, Dimension::Page],
            ApiRow {
                keys: vec!["rust".into(), "https://example.com/a".into()],
                clicks: 12.0,
                impressions: 340.0,
                ctr: 12.0 / 340.0,
                position: 4.2,
            },
        );
        assert_eq!(row.query(), Some("rust"));
        assert_eq!(row.page(), Some("https://example.com/a"));
        assert_eq!(row.metrics.clicks, 12);
        assert_eq!(row.metrics.impressions, 340);
    }

    #[test]
    fn test_field_vitals_from_crux() {
        let record: CruxRecord = serde_json::from_value(serde_json::json!({
            "metrics": {
                "largest_contentful_paint": {"percentiles": {"p75": 2100}},
                "cumulative_layout_shift": {"percentiles": {"p75": "0.05"}},
                "interaction_to_next_paint": {"percentiles": {"p75": 180}}
            }
        }))
        .unwrap();

        let vitals = to_field_vitals("https://example.com/", &record);
        assert_eq!(vitals.lcp_ms, Some(2100.0));
        assert_eq!(vitals.cls, Some(0.05));
        assert_eq!(vitals.inp_ms, Some(180.0));
        assert_eq!(vitals.ttfb_ms, None);
    }

    #[test]
    fn test_lab_report_scales_score() {
        let response: PageSpeedResponse = serde_json::from_value(serde_json::json!({
            "lighthouseResult": {
                "categories": {"performance": {"score": 0.87}},
                "audits": {
                    "largest-contentful-paint": {"score": 0.9, "numericValue": 2300.5},
                    "unrelated-audit": {"numericValue": 1.0}
                }
            }
        }))
        .unwrap();

        let report = to_lab_report("https://example.com/", Strategy::Mobile, response);
        assert!((report.performance_score.unwrap() - 87.0).abs() < 1e-9);
        assert_eq!(report.metrics.get("largest-contentful-paint"), Some(&2300.5));
        assert!(!report.metrics.contains_key("unrelated-audit"));
    }
}
