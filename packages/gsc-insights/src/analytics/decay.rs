//! Content decay: pages losing clicks between two periods.

use serde::{Deserialize, Serialize};

use super::{group_rows, require_dimension};
use crate::error::{InsightsError, Result};
use crate::types::dataset::Dataset;
use crate::types::row::{Dimension, Row};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayOptions {
    /// Pages with fewer earlier clicks than this are ignored.
    pub min_earlier_clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecaySignal {
    pub page: String,
    pub earlier_clicks: u64,
    pub recent_clicks: u64,
    pub click_loss: u64,
    /// `click_loss / earlier_clicks`, percent units.
    pub loss_percent: f64,
}

/// Pages whose clicks fell (or held flat) from `earlier` to `recent`.
///
/// A page absent from the recent period counts as zero clicks there. Pages
/// without earlier clicks have no defined loss and are skipped. Sorted by
/// click loss, largest first.
pub fn detect_decay(
    earlier: &Dataset,
    recent: &Dataset,
    options: &DecayOptions,
) -> Result<Vec<DecaySignal>> {
    require_dimension(earlier, Dimension::Page, "decay detection")?;
    require_dimension(recent, Dimension::Page, "decay detection")?;

    let page_of = |row: &Row| row.page().map(str::to_string);
    let before = group_rows(earlier.rows(), page_of);
    let after = group_rows(recent.rows(), page_of);

    let mut signals: Vec<DecaySignal> = before
        .iter()
        .filter_map(|(page, totals)| {
            let earlier_clicks = totals.metrics().clicks;
            let recent_clicks = after.get(page).map_or(0, |t| t.metrics().clicks);

            if earlier_clicks == 0
                || recent_clicks > earlier_clicks
                || earlier_clicks < options.min_earlier_clicks
            {
                return None;
            }

            let click_loss = earlier_clicks - recent_clicks;
            Some(DecaySignal {
                page: page.clone(),
                earlier_clicks,
                recent_clicks,
                click_loss,
                loss_percent: click_loss as f64 * 100.0 / earlier_clicks as f64,
            })
        })
        .collect();

    signals.sort_by(|a, b| b.click_loss.cmp(&a.click_loss).then_with(|| a.page.cmp(&b.page)));
    Ok(signals)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropAlertOptions {
    /// Minimum loss, in percent, that raises an alert.
    pub threshold_percent: f64,
    pub min_earlier_clicks: u64,
}

impl Default for DropAlertOptions {
    fn default() -> Self {
        Self {
            threshold_percent: 50.0,
            min_earlier_clicks: 0,
        }
    }
}

impl DropAlertOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.threshold_percent) {
            return Err(InsightsError::validation(format!(
                "drop threshold must be between 0 and 100 percent, got {}",
                self.threshold_percent
            )));
        }
        Ok(())
    }
}

/// Decay signals whose loss meets `threshold_percent`.
///
pub fn drop_alerts(
    earlier: &Dataset,
    recent: &Dataset,
    options: &DropAlertOptions,
) -> Result<Vec<DecaySignal>> {
    options.validate()?;

    let decay = detect_decay(
        earlier,
        recent,
        &DecayOptions {
            min_earlier_clicks: options.min_earlier_clicks,
        },
    )?;

    Ok(decay
        .into_iter()
        .filter(|s| s.loss_percent >= options.threshold_percent)
        .collect())
}
