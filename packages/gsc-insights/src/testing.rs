//! Testing utilities including mock implementations.
//!
//! Useful for testing applications that build on the insights library
//! without making real Search Console or PageSpeed calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{ErrorKind, InsightsError, Result};
use crate::traits::{page_experience::PageExperienceApi, search_console::SearchConsoleApi};
use crate::types::{
    experience::{FieldVitals, FormFactor, LabReport, Strategy},
    inspection::UrlInspection,
    period::Period,
    query::{AnalyticsQuery, FilterOperator, PageWindow},
    row::{Dimension, DimensionKey, Metrics, Row},
};

/// Message the upstream uses when the credential can't see a property.
pub const PERMISSION_DENIED_MESSAGE: &str =
    "User does not have sufficient permission for site. See also: https://support.google.com/webmasters/answer/2451999.";

/// A mock Search Console for testing.
///
/// Serves predefined rows per `(site, period)`, honours the requested page
/// window, and records every call.
#[derive(Default, Clone)]
pub struct MockSearchConsole {
    /// Rows by site and period
    rows: Arc<RwLock<HashMap<(String, Period), Vec<Row>>>>,

    /// Inspection results by URL
    inspections: Arc<RwLock<HashMap<String, UrlInspection>>>,

    /// Sites the credential has no permission for
    denied_sites: Arc<RwLock<HashSet<String>>>,

    /// URLs whose inspection always fails
    failing_urls: Arc<RwLock<HashMap<String, InsightsError>>>,

    /// Errors returned by the next calls, in order, before any data
    scripted_failures: Arc<RwLock<VecDeque<InsightsError>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockSearchConsoleCall>>>,
}

/// Record of a call made to the mock Search Console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSearchConsoleCall {
    Query {
        site_url: String,
        period: Period,
        start_row: usize,
        row_limit: usize,
    },
    InspectUrl {
        site_url: String,
        url: String,
    },
}

impl MockSearchConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` for queries against `site_url` over `period`.
    pub fn with_rows(self, site_url: impl Into<String>, period: Period, rows: Vec<Row>) -> Self {
        self.rows
            .write()
            .unwrap()
            .insert((site_url.into(), period), rows);
        self
    }

    pub fn with_inspection(self, inspection: UrlInspection) -> Self {
        self.inspections
            .write()
            .unwrap()
            .insert(inspection.url.clone(), inspection);
        self
    }

    /// Every call naming `site_url` fails with a permission error.
    pub fn deny_site(self, site_url: impl Into<String>) -> Self {
        self.denied_sites.write().unwrap().insert(site_url.into());
        self
    }

    /// Inspection of `url` always fails with `error`.
    pub fn fail_url(self, url: impl Into<String>, error: InsightsError) -> Self {
        self.failing_urls.write().unwrap().insert(url.into(), error);
        self
    }

    /// The next call (of any kind) fails with `error`. Queue several to fail
    /// several calls in a row.
    pub fn fail_next(self, error: InsightsError) -> Self {
        self.scripted_failures.write().unwrap().push_back(error);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockSearchConsoleCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn query_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockSearchConsoleCall::Query { .. }))
            .count()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn check_failures(&self, site_url: &str) -> Result<()> {
        if let Some(err) = self.scripted_failures.write().unwrap().pop_front() {
            return Err(err);
        }
        if self.denied_sites.read().unwrap().contains(site_url) {
            return Err(InsightsError::from_status(Some(403), PERMISSION_DENIED_MESSAGE));
        }
        Ok(())
    }
}

fn matches_filters(row: &Row, query: &AnalyticsQuery) -> bool {
    query.filters.iter().all(|filter| {
        let Some(value) = row.keys.get(filter.dimension) else {
            return true;
        };
        match filter.operator {
            FilterOperator::Equals => value == filter.expression,
            FilterOperator::NotEquals => value != filter.expression,
            FilterOperator::Contains => value.contains(&filter.expression),
            FilterOperator::NotContains => !value.contains(&filter.expression),
            // Regex operators are passed through unfiltered.
            FilterOperator::IncludingRegex | FilterOperator::ExcludingRegex => true,
        }
    })
}

#[async_trait]
impl SearchConsoleApi for MockSearchConsole {
    async fn query(&self, site_url: &str, query: &AnalyticsQuery, window: PageWindow) -> Result<Vec<Row>> {
        self.calls.write().unwrap().push(MockSearchConsoleCall::Query {
            site_url: site_url.to_string(),
            period: query.period,
            start_row: window.start_row,
            row_limit: window.row_limit,
        });

        self.check_failures(site_url)?;

        let rows = self.rows.read().unwrap();
        let matching: Vec<Row> = rows
            .get(&(site_url.to_string(), query.period))
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filters(row, query))
                    .skip(window.start_row)
                    .take(window.row_limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(matching)
    }

    async fn inspect_url(&self, site_url: &str, url: &str) -> Result<UrlInspection> {
        self.calls.write().unwrap().push(MockSearchConsoleCall::InspectUrl {
            site_url: site_url.to_string(),
            url: url.to_string(),
        });

        self.check_failures(site_url)?;

        if let Some(err) = self.failing_urls.read().unwrap().get(url) {
            return Err(err.clone());
        }

        self.inspections
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                InsightsError::from_status(Some(404), format!("No inspection data for {}", url))
            })
    }
}

/// A mock page experience client for testing.
#[derive(Default, Clone)]
pub struct MockPageExperience {
    /// Lab reports by URL
    lab_reports: Arc<RwLock<HashMap<String, LabReport>>>,

    /// Field vitals by URL
    field_vitals: Arc<RwLock<HashMap<String, FieldVitals>>>,

    /// URLs whose calls fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockPageExperienceCall>>>,
}

/// Record of a call made to the mock page experience client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockPageExperienceCall {
    LabReport { url: String, strategy: Strategy },
    FieldVitals { url: String, form_factor: FormFactor },
}

impl MockPageExperience {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lab_report(self, report: LabReport) -> Self {
        self.lab_reports
            .write()
            .unwrap()
            .insert(report.url.clone(), report);
        self
    }

    pub fn with_field_vitals(self, vitals: FieldVitals) -> Self {
        self.field_vitals
            .write()
            .unwrap()
            .insert(vitals.url.clone(), vitals);
        self
    }

    /// Mark a URL as failing with a quota error.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockPageExperienceCall> {
        self.calls.read().unwrap().clone()
    }

    fn check_failure(&self, url: &str) -> Result<()> {
        if self.fail_urls.read().unwrap().iter().any(|u| u == url) {
            return Err(InsightsError::new(
                ErrorKind::Quota,
                "Quota exceeded for quota metric 'Queries per day'",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PageExperienceApi for MockPageExperience {
    async fn lab_report(&self, url: &str, strategy: Strategy) -> Result<LabReport> {
        self.calls.write().unwrap().push(MockPageExperienceCall::LabReport {
            url: url.to_string(),
            strategy,
        });
        self.check_failure(url)?;

        Ok(self
            .lab_reports
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| LabReport {
                url: url.to_string(),
                strategy,
                performance_score: None,
                metrics: Default::default(),
            }))
    }

    async fn field_vitals(&self, url: &str, form_factor: FormFactor) -> Result<FieldVitals> {
        self.calls.write().unwrap().push(MockPageExperienceCall::FieldVitals {
            url: url.to_string(),
            form_factor,
        });
        self.check_failure(url)?;

        self.field_vitals
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                InsightsError::from_status(Some(404), format!("chrome ux report data not found for {}", url))
            })
    }
}

/// `count` distinct query rows (`q0`, `q1`, ...) with descending clicks.
pub fn query_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new(
                DimensionKey::new().with(Dimension::Query, format!("q{}", i)),
                Metrics::new((count - i) as u64, 10 * (count - i) as u64, 1.0 + (i % 50) as f64),
            )
        })
        .collect()
}
