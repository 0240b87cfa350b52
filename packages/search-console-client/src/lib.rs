//! Pure Google Search Console REST API client.
//!
//! A minimal client for the Search Console API (search analytics, URL
//! inspection, site listing) plus the PageSpeed Insights and Chrome UX Report
//! APIs. No retries, pagination or classification happen here; callers layer
//! that on top.
//!
//! # Example
//!
//! ```rust,ignore
//! use search_console_client::{SearchConsoleClient, SearchAnalyticsRequest};
//!
//! let client = SearchConsoleClient::new("ya29.access-token");
//!
//! let rows = client
//!     .query_search_analytics("https://example.com/", &SearchAnalyticsRequest {
//!         start_date: "2024-01-01".into(),
//!         end_date: "2024-01-28".into(),
//!         dimensions: vec!["query".into()],
//!         row_limit: 1000,
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{ApiError, Result};
pub use types::*;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

const SEARCH_CONSOLE_BASE_URL: &str = "https://searchconsole.googleapis.com";
const WEBMASTERS_PATH: &str = "/webmasters/v3";
const INSPECTION_PATH: &str = "/v1/urlInspection/index:inspect";
const PAGESPEED_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
const CRUX_URL: &str = "https://chromeuxreport.googleapis.com/v1/records:queryRecord";

/// Percent-encode a site identifier for use as a single path segment.
pub fn encode_site_url(site_url: &str) -> String {
    url::form_urlencoded::byte_serialize(site_url.as_bytes()).collect()
}

/// Turn a non-2xx response into [`ApiError::Api`], preferring the
/// `error.message` field of Google's JSON error envelope over the raw body.
async fn into_api_error(resp: Response) -> ApiError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    ApiError::Api { status, message }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let resp = request.send().await?;
    if !resp.status().is_success() {
        return Err(into_api_error(resp).await);
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Search Console API client authenticated with an OAuth access token.
///
/// Token acquisition and refresh are the caller's concern.
#[derive(Clone)]
pub struct SearchConsoleClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl SearchConsoleClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: SEARCH_CONSOLE_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `GSC_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GSC_ACCESS_TOKEN")
            .map_err(|_| ApiError::Config("GSC_ACCESS_TOKEN not set".into()))?;
        Ok(Self::new(token))
    }

    /// Set a custom base URL (for proxies and test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one search analytics query. Returns at most `row_limit` rows
    /// starting at `start_row`; paging is left to the caller.
    pub async fn query_search_analytics(
        &self,
        site_url: &str,
        request: &SearchAnalyticsRequest,
    ) -> Result<Vec<ApiRow>> {
        let url = format!(
            "{}{}/sites/{}/searchAnalytics/query",
            self.base_url,
            WEBMASTERS_PATH,
            encode_site_url(site_url)
        );
        tracing::debug!(
            site_url,
            start_row = request.start_row,
            row_limit = request.row_limit,
            "Querying search analytics"
        );

        let resp: SearchAnalyticsResponse = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(request),
        )
        .await?;
        Ok(resp.rows)
    }

    /// Inspect the index status of one URL inside a property.
    pub async fn inspect_url(
        &self,
        site_url: &str,
        inspection_url: &str,
    ) -> Result<InspectionResult> {
        let url = format!("{}{}", self.base_url, INSPECTION_PATH);
        let body = InspectUrlRequest {
            inspection_url: inspection_url.to_string(),
            site_url: site_url.to_string(),
            language_code: None,
        };
        tracing::debug!(site_url, inspection_url, "Inspecting URL");

        let resp: InspectUrlResponse = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(&body),
        )
        .await?;
        Ok(resp.inspection_result)
    }

    /// List the properties the credential can see.
    pub async fn list_sites(&self) -> Result<Vec<SiteEntry>> {
        let url = format!("{}{}/sites", self.base_url, WEBMASTERS_PATH);
        let resp: SitesListResponse =
            send_json(self.client.get(&url).bearer_auth(&self.access_token)).await?;
        Ok(resp.site_entry)
    }
}

/// PageSpeed Insights and CrUX client authenticated with an API key.
#[derive(Clone)]
pub struct PageSpeedClient {
    client: reqwest::Client,
    api_key: String,
    pagespeed_url: String,
    crux_url: String,
}

impl PageSpeedClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            pagespeed_url: PAGESPEED_URL.to_string(),
            crux_url: CRUX_URL.to_string(),
        }
    }

    /// Create from `PAGESPEED_API_KEY`, returning `None` when it is unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("PAGESPEED_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }

    /// Point both endpoints at a custom host (for proxies and test servers).
    pub fn with_endpoints(
        mut self,
        pagespeed_url: impl Into<String>,
        crux_url: impl Into<String>,
    ) -> Self {
        self.pagespeed_url = pagespeed_url.into();
        self.crux_url = crux_url.into();
        self
    }

    /// Run a Lighthouse performance audit. `strategy` is `mobile` or `desktop`.
    pub async fn run_pagespeed(&self, page_url: &str, strategy: &str) -> Result<PageSpeedResponse> {
        tracing::debug!(page_url, strategy, "Running PageSpeed audit");
        send_json(self.client.get(&self.pagespeed_url).query(&[
            ("url", page_url),
            ("strategy", strategy),
            ("category", "performance"),
            ("key", self.api_key.as_str()),
        ]))
        .await
    }

    /// Query the Chrome UX Report for field data on one URL.
    pub async fn query_crux(&self, page_url: &str, form_factor: Option<&str>) -> Result<CruxRecord> {
        let body = CruxQueryRequest {
            url: page_url.to_string(),
            form_factor: form_factor.map(str::to_string),
        };
        tracing::debug!(page_url, ?form_factor, "Querying CrUX record");
        let resp: CruxResponse = send_json(
            self.client
                .post(&self.crux_url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body),
        )
        .await?;
        Ok(resp.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_site_url() {
        assert_eq!(
            encode_site_url("https://example.com/"),
            "https%3A%2F%2Fexample.com%2F"
        );
        assert_eq!(encode_site_url("sc-domain:example.com"), "sc-domain%3Aexample.com");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = SearchAnalyticsRequest {
            start_date: "2024-01-01".into(),
            end_date: "2024-01-31".into(),
            dimensions: vec!["query".into(), "page".into()],
            search_type: Some("web".into()),
            row_limit: 25_000,
            start_row: 25_000,
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["startDate"], "2024-01-01");
        assert_eq!(json["rowLimit"], 25_000);
        assert_eq!(json["startRow"], 25_000);
        assert_eq!(json["type"], "web");
        assert!(json.get("dimensionFilterGroups").is_none());
    }

    #[test]
    fn test_missing_rows_deserialize_as_empty() {
        let resp: SearchAnalyticsResponse =
            serde_json::from_str(r#"{"responseAggregationType":"byProperty"}"#).unwrap();
        assert!(resp.rows.is_empty());
    }

    #[test]
    fn test_crux_p75_accepts_string_and_number() {
        let record: CruxRecord = serde_json::from_str(
            r#"{"metrics":{
                "largest_contentful_paint":{"percentiles":{"p75":2400}},
                "cumulative_layout_shift":{"percentiles":{"p75":"0.08"}}
            }}"#,
        )
        .unwrap();
        let lcp = record.metrics["largest_contentful_paint"].percentiles.as_ref().unwrap();
        let cls = record.metrics["cumulative_layout_shift"].percentiles.as_ref().unwrap();
        assert_eq!(lcp.p75_f64(), Some(2400.0));
        assert_eq!(cls.p75_f64(), Some(0.08));
    }

    #[test]
    fn test_api_error_status() {
        let err = ApiError::Api {
            status: 429,
            message: "Quota exceeded".into(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(ApiError::Parse("bad".into()).status(), None);
    }
}
