//! Typed errors for the insights library.
//!
//! Whatever the transport raises is normalized once, by [`classify`], into an
//! [`InsightsError`] carrying a closed [`ErrorKind`] tag plus the original
//! status and message. Retry, fallback and reporting logic switch on that
//! value and nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::config::AuthMode;
use crate::types::outcome::Failure;

/// Classification tag for every failure the library surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rate limited or server-side failure (HTTP 429 / 5xx)
    Transient,

    /// The credential cannot access the requested property
    Permission,

    /// Credential invalid or expired
    Authentication,

    /// Explicit quota-exceeded signal
    Quota,

    /// Malformed input, rejected before or by the upstream
    Validation,

    /// Anything else
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Permission => "permission",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Quota => "quota",
            ErrorKind::Validation => "validation",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Map a transport failure onto an [`ErrorKind`].
///
/// Precedence matters: a 429 that says "quota" is a quota error, a 403 that
/// says "permission" is a permission error.
pub fn classify(status: Option<u16>, message: &str) -> ErrorKind {
    let lower = message.to_ascii_lowercase();

    if status == Some(401)
        || lower.contains("invalid_grant")
        || lower.contains("invalid credentials")
        || lower.contains("unauthenticated")
    {
        return ErrorKind::Authentication;
    }
    if lower.contains("quota") || lower.contains("ratelimitexceeded") {
        return ErrorKind::Quota;
    }
    match status {
        Some(429) => return ErrorKind::Transient,
        Some(s) if s >= 500 => return ErrorKind::Transient,
        _ => {}
    }
    if lower.contains("permission") || status == Some(403) {
        return ErrorKind::Permission;
    }
    match status {
        Some(400) | Some(422) => ErrorKind::Validation,
        _ => ErrorKind::Unknown,
    }
}

/// The single error type of the insights library.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error: {message}")]
pub struct InsightsError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl InsightsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Build from a raw status/message pair, classifying it.
    pub fn from_status(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(status, &message),
            status,
            message,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// 429 and 5xx are retried; no status means a non-HTTP failure, which is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, Some(s) if s == 429 || s >= 500)
    }

    /// Whether the message reports an access problem that the domain-property
    /// fallback may fix.
    pub fn is_permission_denied(&self) -> bool {
        self.message.to_ascii_lowercase().contains("permission")
    }

    /// Human-readable remediation for the caller.
    pub fn hint(&self, auth_mode: AuthMode) -> String {
        match self.kind {
            ErrorKind::Transient => {
                "The API is temporarily unavailable or rate limiting requests. Retries were \
                 exhausted; wait a minute and try again."
                    .to_string()
            }
            ErrorKind::Permission => {
                "The credential cannot access this property. Check the property is listed for \
                 this account and try both the URL-prefix form (https://example.com/) and the \
                 domain form (sc-domain:example.com)."
                    .to_string()
            }
            ErrorKind::Authentication => match auth_mode {
                AuthMode::OAuth => "The OAuth access token is invalid or expired. Re-run the \
                     authorization flow and supply a fresh GSC_ACCESS_TOKEN."
                    .to_string(),
                AuthMode::ServiceAccount => "The service account credential was rejected. \
                     Verify the key file is current and that the service account email has \
                     been added as a user on the Search Console property."
                    .to_string(),
            },
            ErrorKind::Quota => {
                "The API quota is exhausted. Wait for the quota window to reset (daily quotas \
                 reset at midnight Pacific time) or reduce batch sizes."
                    .to_string()
            }
            ErrorKind::Validation => {
                format!("The request was rejected as invalid: {}", self.message)
            }
            ErrorKind::Unknown => {
                "An unexpected error occurred. Check the message for details.".to_string()
            }
        }
    }

    /// Convert into the serializable failure record used in outcomes.
    pub fn to_failure(&self, auth_mode: AuthMode) -> Failure {
        Failure {
            kind: self.kind,
            status: self.status,
            message: self.message.clone(),
            hint: self.hint(auth_mode),
        }
    }
}

#[cfg(feature = "google")]
impl From<search_console_client::ApiError> for InsightsError {
    fn from(err: search_console_client::ApiError) -> Self {
        use search_console_client::ApiError;

        match err {
            ApiError::Api { status, message } => Self::from_status(Some(status), message),
            ApiError::Config(message) => Self::new(ErrorKind::Authentication, message),
            ApiError::Parse(message) => Self::new(ErrorKind::Unknown, message),
            other => {
                let status = other.status();
                Self::from_status(status, other.to_string())
            }
        }
    }
}

/// Result type alias for insights operations.
pub type Result<T> = std::result::Result<T, InsightsError>;
