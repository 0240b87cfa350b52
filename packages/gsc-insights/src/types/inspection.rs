//! URL inspection results.

use serde::{Deserialize, Serialize};

/// Index status of one URL as reported by the inspection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlInspection {
    pub url: String,
    /// `PASS`, `PARTIAL`, `FAIL` or `NEUTRAL`
    pub verdict: Option<String>,
    /// Coverage state, e.g. "Submitted and indexed"
    pub coverage_state: Option<String>,
    pub indexing_state: Option<String>,
    pub robots_txt_state: Option<String>,
    pub page_fetch_state: Option<String>,
    pub last_crawl_time: Option<String>,
    pub google_canonical: Option<String>,
    pub user_canonical: Option<String>,
    pub inspection_link: Option<String>,
}

impl UrlInspection {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.verdict.as_deref() == Some("PASS")
    }

    /// Google picked a different canonical than the page declares.
    pub fn canonical_mismatch(&self) -> bool {
        match (&self.google_canonical, &self.user_canonical) {
            (Some(google), Some(user)) => google != user,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_mismatch() {
        let mut inspection = UrlInspection::new("https://example.com/a");
        assert!(!inspection.canonical_mismatch());

        inspection.user_canonical = Some("https://example.com/a".into());
        inspection.google_canonical = Some("https://example.com/b".into());
        assert!(inspection.canonical_mismatch());
    }
}
