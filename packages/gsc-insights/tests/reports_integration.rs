//! Integration tests for the report operations.
//!
//! These run the full stack against the mock clients:
//! 1. Fetch with pagination, retry and permission fallback
//! 2. Transform with the analytics engine
//! 3. Assemble batch and composite reports

use std::time::Duration;

use gsc_insights::{
    analytics::{
        CannibalizationOptions, CtrBenchmarkOptions, CtrCurve, DecayOptions, DropAlertOptions,
        Recommendation,
    },
    fetch::fetch_dataset,
    reports::{self, PageHealthOptions},
    testing::{query_rows, MockPageExperience, MockSearchConsole, MockSearchConsoleCall},
    AnalyticsQuery, Dimension, DimensionKey, ErrorKind, FieldVitals, InsightsConfig,
    InsightsContext, InsightsError, LabReport, Metrics, PaginationConfig, Period, RetryPolicy,
    ResolutionPolicy, Row, Strategy, UrlInspection,
};
use tokio::time::Instant;

const SITE: &str = "https://example.com/";

fn earlier() -> Period {
    Period::parse("2024-01-01", "2024-01-28").unwrap()
}

fn later() -> Period {
    Period::parse("2024-01-29", "2024-02-25").unwrap()
}

fn page_row(page: &str, clicks: u64, impressions: u64, position: f64) -> Row {
    Row::new(
        DimensionKey::new().with(Dimension::Page, page),
        Metrics::new(clicks, impressions, position),
    )
}

fn query_page_row(query: &str, page: &str, clicks: u64, impressions: u64, position: f64) -> Row {
    Row::new(
        DimensionKey::new()
            .with(Dimension::Query, query)
            .with(Dimension::Page, page),
        Metrics::new(clicks, impressions, position),
    )
}

fn context(mock: &MockSearchConsole) -> InsightsContext {
    InsightsContext::new(mock.clone(), InsightsConfig::default())
}

// =============================================================================
// Fetch stack
// =============================================================================

#[tokio::test]
async fn test_paginates_until_short_page() {
    let mock = MockSearchConsole::new().with_rows(SITE, earlier(), query_rows(60_000));
    let ctx = context(&mock);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let dataset = fetch_dataset(&ctx, SITE, &query).await.unwrap();

    assert_eq!(dataset.len(), 60_000);
    assert_eq!(mock.query_calls(), 3);

    let starts: Vec<usize> = mock
        .calls()
        .iter()
        .filter_map(|c| match c {
            MockSearchConsoleCall::Query { start_row, .. } => Some(*start_row),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![0, 25_000, 50_000]);
}

#[tokio::test]
async fn test_row_cap_bounds_dataset() {
    let mock = MockSearchConsole::new().with_rows(SITE, earlier(), query_rows(120_000));
    let ctx = context(&mock);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let dataset = fetch_dataset(&ctx, SITE, &query).await.unwrap();
    assert_eq!(dataset.len(), 100_000);
    assert_eq!(mock.query_calls(), 4);

    // Per-query override
    mock.clear_calls();
    let capped = fetch_dataset(&ctx, SITE, &query.clone().with_max_rows(30_000))
        .await
        .unwrap();
    assert_eq!(capped.len(), 30_000);
    assert_eq!(mock.query_calls(), 2);
}

#[tokio::test]
async fn test_small_page_size_config() {
    let mock = MockSearchConsole::new().with_rows(SITE, earlier(), query_rows(25));
    let config = InsightsConfig::default().with_pagination(PaginationConfig::new(100, 10));
    let ctx = InsightsContext::new(mock.clone(), config);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let dataset = fetch_dataset(&ctx, SITE, &query).await.unwrap();
    assert_eq!(dataset.len(), 25);
    assert_eq!(mock.query_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let mock = MockSearchConsole::new()
        .with_rows(SITE, earlier(), query_rows(5))
        .fail_next(InsightsError::from_status(Some(503), "Backend Error"))
        .fail_next(InsightsError::from_status(Some(429), "Too Many Requests"));
    let ctx = context(&mock);

    let begin = Instant::now();
    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let dataset = fetch_dataset(&ctx, SITE, &query).await.unwrap();

    assert_eq!(dataset.len(), 5);
    assert_eq!(mock.query_calls(), 3);
    // 1000 × 2^0 × 0.5 + 1000 × 2^1 × 0.5
    assert!(begin.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_are_not_retried() {
    let mock = MockSearchConsole::new()
        .fail_next(InsightsError::from_status(Some(404), "Requested entity was not found."));
    let ctx = context(&mock);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let err = fetch_dataset(&ctx, SITE, &query).await.unwrap_err();

    assert_eq!(err.status, Some(404));
    assert_eq!(mock.query_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_returns_last_error() {
    let mut mock = MockSearchConsole::new();
    for _ in 0..4 {
        mock = mock.fail_next(InsightsError::from_status(Some(500), "Internal error"));
    }
    let config = InsightsConfig::default().with_retry(RetryPolicy::new(4, Duration::from_millis(10)));
    let ctx = InsightsContext::new(mock.clone(), config);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let err = fetch_dataset(&ctx, SITE, &query).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Transient);
    assert_eq!(mock.query_calls(), 4);
}

#[tokio::test]
async fn test_permission_fallback_to_domain_property() {
    let mock = MockSearchConsole::new()
        .deny_site(SITE)
        .with_rows("sc-domain:example.com", earlier(), query_rows(3));
    let ctx = context(&mock);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let dataset = fetch_dataset(&ctx, SITE, &query).await.unwrap();
    assert_eq!(dataset.len(), 3);

    let sites: Vec<String> = mock
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            MockSearchConsoleCall::Query { site_url, .. } => Some(site_url),
            _ => None,
        })
        .collect();
    assert_eq!(sites, vec![SITE.to_string(), "sc-domain:example.com".to_string()]);
}

#[tokio::test]
async fn test_permission_error_on_domain_property_propagates() {
    let mock = MockSearchConsole::new().deny_site("sc-domain:example.com");
    let ctx = context(&mock);

    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let err = fetch_dataset(&ctx, "sc-domain:example.com", &query)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Permission);
    assert_eq!(mock.query_calls(), 1);
}

// =============================================================================
// Two-period reports
// =============================================================================

#[tokio::test]
async fn test_compare_periods_report() {
    let mock = MockSearchConsole::new()
        .with_rows(SITE, earlier(), vec![page_row("/a", 10, 100, 3.0)])
        .with_rows(SITE, later(), vec![page_row("/a", 5, 100, 3.0)]);
    let ctx = context(&mock);

    let query = AnalyticsQuery::new(later(), [Dimension::Page]);
    let comparison = reports::compare_periods(&ctx, SITE, &query, earlier(), later())
        .await
        .unwrap();

    assert_eq!(comparison.keys.len(), 1);
    assert_eq!(comparison.keys[0].changes.clicks.delta, -5.0);
    assert_eq!(comparison.keys[0].changes.clicks.percent_change, Some(-50.0));
    assert_eq!(comparison.earlier_period, earlier());
}

#[tokio::test]
async fn test_decay_and_drop_alerts_reports() {
    let mock = MockSearchConsole::new()
        .with_rows(
            SITE,
            earlier(),
            vec![page_row("/decaying", 100, 2000, 3.0), page_row("/growing", 40, 900, 6.0)],
        )
        .with_rows(
            SITE,
            later(),
            vec![page_row("/decaying", 40, 1500, 5.0), page_row("/growing", 100, 1200, 4.0)],
        );
    let ctx = context(&mock);

    let decay = reports::detect_decay(&ctx, SITE, earlier(), later(), &DecayOptions::default())
        .await
        .unwrap();
    assert_eq!(decay.len(), 1);
    assert_eq!(decay[0].page, "/decaying");
    assert_eq!(decay[0].click_loss, 60);
    assert_eq!(decay[0].loss_percent, 60.0);

    let alerts = reports::drop_alerts(&ctx, SITE, earlier(), later(), &DropAlertOptions::default())
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);

    let strict = DropAlertOptions {
        threshold_percent: 75.0,
        ..Default::default()
    };
    let alerts = reports::drop_alerts(&ctx, SITE, earlier(), later(), &strict)
        .await
        .unwrap();
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn test_two_period_report_fails_when_one_side_fails() {
    let mock = MockSearchConsole::new()
        .with_rows(SITE, earlier(), vec![page_row("/a", 1, 10, 1.0)])
        .fail_next(InsightsError::from_status(Some(400), "Invalid dimension"));
    let ctx = context(&mock);

    let err = reports::detect_decay(&ctx, SITE, earlier(), later(), &DecayOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_invalid_options_rejected_before_fetching() {
    let mock = MockSearchConsole::new().with_rows(SITE, earlier(), query_rows(10));

    let bad_threshold = DropAlertOptions {
        threshold_percent: 150.0,
        ..Default::default()
    };
    let err = reports::drop_alerts(&context(&mock), SITE, earlier(), later(), &bad_threshold)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let bad_shortfall = CtrBenchmarkOptions {
        shortfall_threshold: 1.5,
        ..Default::default()
    };
    let query = AnalyticsQuery::new(earlier(), [Dimension::Query]);
    let err = reports::ctr_benchmark(&context(&mock), SITE, &query, &CtrCurve::default(), &bad_shortfall)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let inverted = InsightsConfig::default().with_resolution(ResolutionPolicy {
        redirect_below: 0.8,
        differentiate_from: 0.2,
    });
    let ctx = InsightsContext::new(mock.clone(), inverted);
    let err = reports::resolve_cannibalization(&ctx, SITE, earlier(), &CannibalizationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert!(mock.calls().is_empty());
}

// =============================================================================
// Cannibalization
// =============================================================================

#[tokio::test]
async fn test_resolve_cannibalization_report() {
    let mock = MockSearchConsole::new().with_rows(
        SITE,
        earlier(),
        vec![
            query_page_row("rust tutorial", "/guide", 200, 4000, 2.0),
            query_page_row("rust tutorial", "/blog/old-guide", 10, 900, 11.0),
            query_page_row("rust tutorial", "/book", 120, 3000, 3.5),
            query_page_row("solo", "/solo", 50, 500, 1.0),
        ],
    );
    let ctx = context(&mock);

    let groups = reports::detect_cannibalization(&ctx, SITE, earlier(), &CannibalizationOptions::default())
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0].position_variance > 0.0);

    let resolved =
        reports::resolve_cannibalization(&ctx, SITE, earlier(), &CannibalizationOptions::default())
            .await
            .unwrap();
    assert_eq!(resolved[0].winner.page, "/guide");
    let action = |page: &str| {
        resolved[0]
            .others
            .iter()
            .find(|p| p.page == page)
            .map(|p| p.action)
    };
    assert_eq!(action("/blog/old-guide"), Some(Recommendation::Redirect));
    assert_eq!(action("/book"), Some(Recommendation::Differentiate));
}

// =============================================================================
// Batch inspection
// =============================================================================

fn indexed(url: &str) -> UrlInspection {
    let mut inspection = UrlInspection::new(url);
    inspection.verdict = Some("PASS".to_string());
    inspection.coverage_state = Some("Submitted and indexed".to_string());
    inspection
}

#[tokio::test(start_paused = true)]
async fn test_batch_inspect_isolates_failures() {
    let mock = MockSearchConsole::new()
        .with_inspection(indexed("https://example.com/a"))
        .with_inspection(indexed("https://example.com/c"))
        .fail_url(
            "https://example.com/b",
            InsightsError::from_status(Some(400), "Invalid URL"),
        );
    let ctx = context(&mock);

    let urls = vec![
        "https://example.com/a".to_string(),
        "https://example.com/b".to_string(),
        "https://example.com/c".to_string(),
    ];

    let begin = Instant::now();
    let results = reports::batch_inspect(&ctx, SITE, &urls).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].input, "https://example.com/a");
    assert!(results[0].outcome.is_ok());
    assert!(results[1].outcome.is_failed());
    assert_eq!(
        results[1].outcome.failure().map(|f| f.kind),
        Some(ErrorKind::Validation)
    );
    assert!(results[2].outcome.is_ok());

    // Two delays of 1000 ms between three calls.
    assert!(begin.elapsed() >= Duration::from_millis(2000));
}

#[tokio::test]
async fn test_batch_inspect_rejects_oversize_batch() {
    let mock = MockSearchConsole::new();
    let config = InsightsConfig::default().with_batch(2, Duration::ZERO);
    let ctx = InsightsContext::new(mock.clone(), config);

    let urls: Vec<String> = (0..3).map(|i| format!("https://example.com/{}", i)).collect();
    let err = reports::batch_inspect(&ctx, SITE, &urls).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(mock.calls().is_empty());
}

// =============================================================================
// Page health
// =============================================================================

#[tokio::test]
async fn test_page_health_without_page_experience() {
    let page = "https://example.com/a";
    let mock = MockSearchConsole::new()
        .with_inspection(indexed(page))
        .with_rows(SITE, earlier(), query_rows(20));
    let ctx = context(&mock);

    let report = reports::page_health(&ctx, SITE, page, earlier(), &PageHealthOptions::default())
        .await
        .unwrap();

    assert_eq!(
        report.names().collect::<Vec<_>>(),
        vec!["inspection", "analytics", "speed", "vitals"]
    );
    assert!(report.get("inspection").unwrap().is_ok());
    assert!(report.get("speed").unwrap().is_not_configured());
    assert!(report.get("vitals").unwrap().is_not_configured());
    assert_eq!(report.failed(), 0);

    match report.get("analytics").and_then(|o| o.data()) {
        Some(reports::PageHealthSection::Analytics(analytics)) => {
            assert_eq!(analytics.top_queries.len(), 10);
            assert_eq!(analytics.top_queries[0].query(), Some("q0"));
        }
        other => panic!("unexpected analytics section: {:?}", other),
    }
}

#[tokio::test]
async fn test_page_health_one_section_fails() {
    let page = "https://example.com/a";
    let mock = MockSearchConsole::new()
        .with_rows(SITE, earlier(), query_rows(3))
        .fail_url(page, InsightsError::from_status(Some(404), "URL not in property"));
    let experience = MockPageExperience::new()
        .with_lab_report(LabReport {
            url: page.to_string(),
            strategy: Strategy::Mobile,
            performance_score: Some(92.0),
            metrics: Default::default(),
        })
        .with_field_vitals(FieldVitals {
            url: page.to_string(),
            lcp_ms: Some(1800.0),
            inp_ms: Some(120.0),
            cls: Some(0.02),
            fcp_ms: None,
            ttfb_ms: None,
        });
    let ctx = context(&mock).with_page_experience(experience.clone());

    let report = reports::page_health(&ctx, SITE, page, earlier(), &PageHealthOptions::default())
        .await
        .unwrap();

    assert_eq!(report.len(), 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 1);
    assert!(report.get("inspection").unwrap().is_failed());
    assert_eq!(experience.calls().len(), 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["inspection"]["status"], "failed");
    assert_eq!(json["speed"]["status"], "ok");
}
