//! Search Console Insights Library
//!
//! Resilient data acquisition from the Search Console API plus computed
//! analytics over the fetched rows.
//!
//! # Design Philosophy
//!
//! - Every physical call is retried on transient failure, falls back to the
//!   domain property on permission errors, and pages past the row ceiling
//! - Analytics are pure functions over complete datasets
//! - Composite reports degrade per section instead of failing as a whole
//! - Configuration and clients travel in an explicit context, no globals
//!
//! # Usage
//!
//! ```rust,ignore
//! use gsc_insights::{InsightsConfig, InsightsContext, Period, reports};
//! use search_console_client::SearchConsoleClient;
//!
//! let ctx = InsightsContext::new(SearchConsoleClient::from_env()?, InsightsConfig::from_env()?);
//!
//! let recent = Period::parse("2024-02-01", "2024-02-28")?;
//! let decay = reports::detect_decay(
//!     &ctx,
//!     "https://example.com/",
//!     recent.preceding()?,
//!     recent,
//!     &Default::default(),
//! )
//! .await?;
//! ```
//!
//! # Modules
//!
//! - [`fetch`] - Retry, permission fallback and pagination
//! - [`execution`] - Sequential rate-limited executor and partial-failure aggregator
//! - [`analytics`] - Pure transforms (comparison, decay, cannibalization, CTR)
//! - [`reports`] - Report operations over an [`InsightsContext`]
//! - [`traits`] - Seams to the transport clients
//! - [`types`] - Data model and configuration
//! - [`testing`] - Mock implementations for testing

pub mod analytics;
pub mod context;
pub mod error;
pub mod execution;
pub mod fetch;
pub mod remote;
pub mod reports;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use context::InsightsContext;
pub use error::{classify, ErrorKind, InsightsError, Result};
pub use execution::Aggregator;
pub use traits::{page_experience::PageExperienceApi, search_console::SearchConsoleApi};
pub use types::{
    config::{
        AuthMode, BatchConfig, InsightsConfig, PaginationConfig, ResolutionPolicy, RetryPolicy,
    },
    dataset::Dataset,
    experience::{FieldVitals, FormFactor, LabReport, Strategy, VitalRating},
    inspection::UrlInspection,
    outcome::{AggregatedReport, BatchOutcome, Failure, Outcome},
    period::Period,
    query::{AnalyticsQuery, DataState, DimensionFilter, FilterOperator, PageWindow, SearchType},
    row::{Dimension, DimensionKey, Metrics, Row},
};
