//! Multi-page fetch loop for datasets larger than the row ceiling.

use std::future::Future;

use crate::error::Result;
use crate::types::config::PaginationConfig;
use crate::types::query::PageWindow;

pub use crate::types::config::ROW_CEILING;

/// Fetch pages in offset order until a short page arrives or `max_rows`
/// rows are accumulated.
///
/// The offset advances by the number of rows actually returned rather than
/// by the requested limit. Never returns more than `max_rows` rows and never
/// issues more than `ceil(max_rows / effective_page_size)` calls.
pub async fn fetch_all_pages<T, F, Fut>(config: &PaginationConfig, fetch_page: F) -> Result<Vec<T>>
where
    F: Fn(PageWindow) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let page_size = config.effective_page_size();
    let max_rows = config.max_rows;
    let mut rows: Vec<T> = Vec::new();
    let mut start_row = 0usize;
    let mut pages = 0usize;

    while start_row < max_rows {
        let limit = page_size.min(max_rows - start_row);
        let mut page = fetch_page(PageWindow {
            row_limit: limit,
            start_row,
        })
        .await?;
        pages += 1;

        let returned = page.len();
        if returned > limit {
            tracing::warn!(returned, limit, "Upstream returned more rows than requested, truncating");
            page.truncate(limit);
        }
        let returned = page.len();
        rows.append(&mut page);

        tracing::debug!(page = pages, start_row, returned, total = rows.len(), "Fetched page");

        if returned < limit {
            break;
        }
        start_row += returned;
    }

    Ok(rows)
}
