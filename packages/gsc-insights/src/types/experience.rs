//! Page experience data: Lighthouse lab results and CrUX field vitals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    #[default]
    Phone,
    Desktop,
    Tablet,
    /// All form factors combined
    All,
}

impl FormFactor {
    /// API value; `None` asks CrUX for all form factors.
    pub fn as_api_str(&self) -> Option<&'static str> {
        match self {
            FormFactor::Phone => Some("PHONE"),
            FormFactor::Desktop => Some("DESKTOP"),
            FormFactor::Tablet => Some("TABLET"),
            FormFactor::All => None,
        }
    }
}

/// Lighthouse lab run for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabReport {
    pub url: String,
    pub strategy: Strategy,
    /// Performance score, 0-100
    pub performance_score: Option<f64>,
    /// Numeric audit values keyed by audit id (milliseconds, CLS unitless)
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

fn rate(value: f64, good: f64, poor: f64) -> VitalRating {
    if value <= good {
        VitalRating::Good
    } else if value <= poor {
        VitalRating::NeedsImprovement
    } else {
        VitalRating::Poor
    }
}

/// 75th percentile field metrics from the Chrome UX Report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldVitals {
    pub url: String,
    pub lcp_ms: Option<f64>,
    pub inp_ms: Option<f64>,
    pub cls: Option<f64>,
    pub fcp_ms: Option<f64>,
    pub ttfb_ms: Option<f64>,
}

impl FieldVitals {
    pub fn lcp_rating(&self) -> Option<VitalRating> {
        self.lcp_ms.map(|v| rate(v, 2500.0, 4000.0))
    }

    pub fn inp_rating(&self) -> Option<VitalRating> {
        self.inp_ms.map(|v| rate(v, 200.0, 500.0))
    }

    pub fn cls_rating(&self) -> Option<VitalRating> {
        self.cls.map(|v| rate(v, 0.1, 0.25))
    }

    /// All three core vitals good; `None` when any of them is missing.
    pub fn passes_core_web_vitals(&self) -> Option<bool> {
        let ratings = [self.lcp_rating()?, self.inp_rating()?, self.cls_rating()?];
        Some(ratings.iter().all(|r| *r == VitalRating::Good))
    }
}
