//! Tagged outcomes for batch items and composite report sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Serializable failure record: classification plus remediation hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
    pub hint: String,
}

/// Result of one independently-executed unit of work.
///
/// `NotConfigured` is not a failure: the capability was never available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok { data: T },
    Failed { error: Failure },
    NotConfigured { reason: String },
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Outcome::Ok { data }
    }

    pub fn failed(error: Failure) -> Self {
        Outcome::Failed { error }
    }

    pub fn not_configured(reason: impl Into<String>) -> Self {
        Outcome::NotConfigured {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Outcome::NotConfigured { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Ok { data } => Some(data),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Per-input result of a batch operation. Batches preserve input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome<T> {
    pub input: String,
    #[serde(flatten)]
    pub outcome: Outcome<T>,
}

/// Composite report: every requested section, in request order, each with
/// its own outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedReport<T> {
    sections: IndexMap<String, Outcome<T>>,
}

impl<T> Default for AggregatedReport<T> {
    fn default() -> Self {
        Self {
            sections: IndexMap::new(),
        }
    }
}

impl<T> AggregatedReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, outcome: Outcome<T>) {
        self.sections.insert(name.into(), outcome);
    }

    pub fn get(&self, name: &str) -> Option<&Outcome<T>> {
        self.sections.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome<T>)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.sections.values().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.sections.values().filter(|o| o.is_failed()).count()
    }

    pub fn not_configured(&self) -> usize {
        self.sections.values().filter(|o| o.is_not_configured()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let ok: Outcome<u32> = Outcome::ok(3);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "ok", "data": 3})
        );

        let missing: Outcome<u32> = Outcome::not_configured("PAGESPEED_API_KEY not set");
        assert_eq!(
            serde_json::to_value(&missing).unwrap()["status"],
            "not_configured"
        );
    }

    #[test]
    fn test_batch_outcome_flattens() {
        let item = BatchOutcome {
            input: "https://example.com/a".to_string(),
            outcome: Outcome::<u32>::failed(Failure {
                kind: ErrorKind::Quota,
                status: Some(429),
                message: "Quota exceeded".into(),
                hint: "wait".into(),
            }),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["input"], "https://example.com/a");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "quota");
    }
}
