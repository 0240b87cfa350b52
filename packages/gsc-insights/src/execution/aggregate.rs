//! Partial-failure aggregation.
//!
//! Fans out to independent sections with bounded concurrency, waits for every
//! one of them to settle, and merges the outcomes by name. A failed section
//! never hides the others.

use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt};
use std::collections::HashSet;
use std::future::Future;

use crate::error::{InsightsError, Result};
use crate::types::config::AuthMode;
use crate::types::outcome::{AggregatedReport, Outcome};

enum SectionWork<'a, T> {
    Run(BoxFuture<'a, Result<T>>),
    NotConfigured(String),
}

struct PendingSection<'a, T> {
    name: String,
    required: bool,
    work: SectionWork<'a, T>,
}

/// Builder for a composite report.
///
/// # Example
///
/// ```rust,ignore
/// let report = Aggregator::new(AuthMode::OAuth)
///     .section("inspection", inspect(ctx, site, url))
///     .section("analytics", analytics(ctx, site, url))
///     .optional_section("speed", speed_future, "PAGESPEED_API_KEY not set")
///     .run(4)
///     .await?;
/// ```
pub struct Aggregator<'a, T> {
    sections: Vec<PendingSection<'a, T>>,
    auth_mode: AuthMode,
}

impl<'a, T: Send + 'a> Aggregator<'a, T> {
    pub fn new(auth_mode: AuthMode) -> Self {
        Self {
            sections: Vec::new(),
            auth_mode,
        }
    }

    /// A section whose failure is recorded but tolerated.
    pub fn section(
        self,
        name: impl Into<String>,
        work: impl Future<Output = Result<T>> + Send + 'a,
    ) -> Self {
        self.push(name, false, SectionWork::Run(work.boxed()))
    }

    /// A section whose failure fails the whole report (after all settle).
    pub fn required_section(
        self,
        name: impl Into<String>,
        work: impl Future<Output = Result<T>> + Send + 'a,
    ) -> Self {
        self.push(name, true, SectionWork::Run(work.boxed()))
    }

    /// A section backed by a capability the deployment may not have.
    ///
    /// `None` is recorded as [`Outcome::NotConfigured`] with `reason`.
    pub fn optional_section<Fut>(
        self,
        name: impl Into<String>,
        work: Option<Fut>,
        reason: impl Into<String>,
    ) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'a,
    {
        let work = match work {
            Some(fut) => SectionWork::Run(fut.boxed()),
            None => SectionWork::NotConfigured(reason.into()),
        };
        self.push(name, false, work)
    }

    fn push(mut self, name: impl Into<String>, required: bool, work: SectionWork<'a, T>) -> Self {
        self.sections.push(PendingSection {
            name: name.into(),
            required,
            work,
        });
        self
    }

    /// Drive all sections, at most `fan_out` at a time.
    ///
    /// Returns `Err` when a required section failed or two sections share a
    /// name; tolerated failures and missing capabilities are part of the
    /// report.
    pub async fn run(self, fan_out: usize) -> Result<AggregatedReport<T>> {
        let fan_out = fan_out.max(1);
        let total = self.sections.len();

        {
            let mut seen = HashSet::with_capacity(total);
            for section in &self.sections {
                if !seen.insert(section.name.as_str()) {
                    return Err(InsightsError::validation(format!(
                        "duplicate report section: {}",
                        section.name
                    )));
                }
            }
        }

        let mut names = Vec::with_capacity(total);
        let mut required = Vec::with_capacity(total);
        let mut slots: Vec<Option<Outcome<T>>> = Vec::with_capacity(total);
        let mut work = Vec::new();

        for (index, section) in self.sections.into_iter().enumerate() {
            names.push(section.name);
            required.push(section.required);
            match section.work {
                SectionWork::Run(fut) => {
                    slots.push(None);
                    work.push(async move { (index, fut.await) });
                }
                SectionWork::NotConfigured(reason) => {
                    slots.push(Some(Outcome::not_configured(reason)));
                }
            }
        }

        let settled: Vec<(usize, Result<T>)> = stream::iter(work)
            .buffer_unordered(fan_out)
            .collect()
            .await;

        let mut required_failure: Option<InsightsError> = None;
        for (index, result) in settled {
            let outcome = match result {
                Ok(data) => Outcome::ok(data),
                Err(err) => {
                    tracing::warn!(
                        section = %names[index],
                        required = required[index],
                        kind = %err.kind,
                        error = %err,
                        "Report section failed"
                    );
                    let failure = err.to_failure(self.auth_mode);
                    if required[index] && required_failure.is_none() {
                        required_failure = Some(err);
                    }
                    Outcome::failed(failure)
                }
            };
            slots[index] = Some(outcome);
        }

        if let Some(err) = required_failure {
            return Err(err);
        }

        let mut report = AggregatedReport::new();
        for (name, slot) in names.into_iter().zip(slots) {
            // Every `Run` slot was filled by the settled loop above.
            if let Some(outcome) = slot {
                report.insert(name, outcome);
            }
        }

        tracing::info!(
            sections = report.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            not_configured = report.not_configured(),
            "Composite report complete"
        );
        Ok(report)
    }
}
