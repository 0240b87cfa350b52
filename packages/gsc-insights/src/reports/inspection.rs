//! Batch URL inspection under a per-call rate quota.

use tracing::{info, warn};

use crate::context::InsightsContext;
use crate::error::{InsightsError, Result};
use crate::execution::{ensure_batch_size, run_sequential};
use crate::fetch::inspect_url;
use crate::types::inspection::UrlInspection;
use crate::types::outcome::{BatchOutcome, Outcome};

/// Inspect `urls` one after another, pausing between calls.
///
/// Batches over the configured maximum are rejected up front. Past that
/// check a failing URL never aborts the batch: it becomes a `Failed`
/// outcome in its slot and the queue moves on.
pub async fn batch_inspect(
    ctx: &InsightsContext,
    site_url: &str,
    urls: &[String],
) -> Result<Vec<BatchOutcome<UrlInspection>>> {
    let batch = ctx.config().batch;
    ensure_batch_size(urls.len(), batch.max_batch_size)?;
    let auth_mode = ctx.config().auth_mode;

    let operations = urls.iter().map(|url| {
        move || async move {
            let outcome = match inspect_url(ctx, site_url, url).await {
                Ok(inspection) => Outcome::ok(inspection),
                Err(err) => {
                    warn!(url = %url, kind = %err.kind, error = %err, "URL inspection failed");
                    Outcome::failed(err.to_failure(auth_mode))
                }
            };
            Ok::<_, InsightsError>(BatchOutcome {
                input: url.clone(),
                outcome,
            })
        }
    });

    let results = run_sequential(operations, batch.delay()).await?;

    info!(
        site_url,
        urls = results.len(),
        failed = results.iter().filter(|r| r.outcome.is_failed()).count(),
        "Batch inspection complete"
    );
    Ok(results)
}
