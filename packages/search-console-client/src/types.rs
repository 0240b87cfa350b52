use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /sites/{siteUrl}/searchAnalytics/query`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsRequest {
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub search_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimension_filter_groups: Vec<DimensionFilterGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_state: Option<String>,
    pub row_limit: u32,
    pub start_row: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionFilterGroup {
    #[serde(rename = "groupType")]
    pub group_type: String,
    pub filters: Vec<DimensionFilter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionFilter {
    pub dimension: String,
    pub operator: String,
    pub expression: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsResponse {
    /// Absent when the query matched nothing.
    #[serde(default)]
    pub rows: Vec<ApiRow>,
    pub response_aggregation_type: Option<String>,
}

/// A raw analytics row; `keys` follow the order of the requested dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesListResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    pub permission_level: String,
}

/// Body of `POST /urlInspection/index:inspect`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectUrlRequest {
    pub inspection_url: String,
    pub site_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectUrlResponse {
    pub inspection_result: InspectionResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionResult {
    pub inspection_result_link: Option<String>,
    pub index_status_result: Option<IndexStatusResult>,
    pub mobile_usability_result: Option<serde_json::Value>,
    pub rich_results_result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatusResult {
    pub verdict: Option<String>,
    pub coverage_state: Option<String>,
    pub robots_txt_state: Option<String>,
    pub indexing_state: Option<String>,
    pub last_crawl_time: Option<String>,
    pub page_fetch_state: Option<String>,
    pub google_canonical: Option<String>,
    pub user_canonical: Option<String>,
    #[serde(default)]
    pub referring_urls: Vec<String>,
}

/// PageSpeed Insights `runPagespeed` response (only the parts we read).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpeedResponse {
    pub id: Option<String>,
    pub lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseResult {
    pub final_url: Option<String>,
    #[serde(default)]
    pub categories: HashMap<String, LighthouseCategory>,
    #[serde(default)]
    pub audits: HashMap<String, LighthouseAudit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseCategory {
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseAudit {
    pub score: Option<f64>,
    pub numeric_value: Option<f64>,
    pub display_value: Option<String>,
}

/// Body of CrUX `records:queryRecord`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CruxQueryRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CruxResponse {
    pub record: CruxRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CruxRecord {
    #[serde(default)]
    pub metrics: HashMap<String, CruxMetric>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CruxMetric {
    pub percentiles: Option<CruxPercentiles>,
}

/// CLS p75 arrives as a string, the timing metrics as integers.
#[derive(Debug, Clone, Deserialize)]
pub struct CruxPercentiles {
    pub p75: serde_json::Value,
}

impl CruxPercentiles {
    pub fn p75_f64(&self) -> Option<f64> {
        match &self.p75 {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Shape of Google API error bodies.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
