//! Rate-limited sequential execution.
//!
//! For upstreams with a per-second call quota: operations run strictly one
//! after another with a fixed pause between them.

use std::future::Future;
use std::time::Duration;

use crate::error::{InsightsError, Result};

/// Reject batches above `max_batch_size` instead of truncating them.
pub fn ensure_batch_size(len: usize, max_batch_size: usize) -> Result<()> {
    if len > max_batch_size {
        return Err(InsightsError::validation(format!(
            "batch of {} items exceeds the maximum of {}",
            len, max_batch_size
        )));
    }
    Ok(())
}

/// Run `operations` in order, sleeping `delay` before each one but the first.
///
/// Results come back in input order. The first failure aborts the rest of
/// the queue; callers that need per-item isolation convert failures into
/// values inside each operation.
pub async fn run_sequential<T, I, F, Fut>(operations: I, delay: Duration) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let operations = operations.into_iter();
    let mut results = Vec::with_capacity(operations.size_hint().0);

    for (index, operation) in operations.enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tracing::debug!(index, "Running queued operation");
        results.push(operation().await?);
    }

    Ok(results)
}
