//! Domain-property fallback for permission failures.
//!
//! A property can be registered as a URL prefix (`https://example.com/`) or
//! as a domain (`sc-domain:example.com`), and a credential may only have
//! access to one of the two. When a call fails with a permission error we try
//! the domain form once.

use std::future::Future;
use url::Url;

use crate::error::Result;

/// Prefix of domain-level property identifiers.
pub const DOMAIN_PROPERTY_PREFIX: &str = "sc-domain:";

/// Normalize a property identifier to its domain form.
///
/// Domain identifiers come back unchanged, as does anything that does not
/// parse as a URL with a host.
pub fn to_domain_property(site_url: &str) -> String {
    if site_url.starts_with(DOMAIN_PROPERTY_PREFIX) {
        return site_url.to_string();
    }
    match Url::parse(site_url) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}{}", DOMAIN_PROPERTY_PREFIX, host),
            None => site_url.to_string(),
        },
        Err(_) => site_url.to_string(),
    }
}

/// Call `operation` with `site_url`; on a permission error retry exactly once
/// with the domain form, if that differs.
///
/// Any other error, or a failure of the fallback itself, is returned as is.
pub async fn with_permission_fallback<T, F, Fut>(site_url: &str, operation: F) -> Result<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match operation(site_url.to_string()).await {
        Ok(value) => Ok(value),
        Err(err) if err.is_permission_denied() => {
            let fallback = to_domain_property(site_url);
            if fallback == site_url {
                return Err(err);
            }
            tracing::info!(
                site_url,
                fallback = %fallback,
                error = %err,
                "Permission denied, retrying with domain property"
            );
            operation(fallback).await
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use std::sync::Mutex;

    #[test]
    fn test_to_domain_property() {
        assert_eq!(to_domain_property("https://example.com/blog/"), "sc-domain:example.com");
        assert_eq!(to_domain_property("http://www.example.com/"), "sc-domain:www.example.com");
        assert_eq!(to_domain_property("sc-domain:example.com"), "sc-domain:example.com");
        assert_eq!(to_domain_property("not a url"), "not a url");
    }

    #[tokio::test]
    async fn test_permission_error_falls_back_to_domain() {
        let seen = Mutex::new(Vec::new());

        let result = with_permission_fallback("https://example.com/blog/", |site| {
            seen.lock().unwrap().push(site.clone());
            async move {
                if site.starts_with("https://") {
                    Err(InsightsError::from_status(
                        Some(403),
                        "User does not have sufficient permission for site",
                    ))
                } else {
                    Ok(site)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "sc-domain:example.com");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["https://example.com/blog/", "sc-domain:example.com"]
        );
    }

    #[tokio::test]
    async fn test_fallback_failure_propagates() {
        let calls = Mutex::new(0);

        let result: Result<()> = with_permission_fallback("https://example.com/", |_site| {
            *calls.lock().unwrap() += 1;
            async { Err(InsightsError::from_status(Some(403), "permission denied")) }
        })
        .await;

        assert!(result.unwrap_err().is_permission_denied());
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_fall_back() {
        let calls = Mutex::new(0);

        let result: Result<()> = with_permission_fallback("https://example.com/", |_site| {
            *calls.lock().unwrap() += 1;
            async { Err(InsightsError::from_status(Some(400), "Invalid dimension")) }
        })
        .await;

        assert_eq!(result.unwrap_err().status, Some(400));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_domain_identifier_is_not_retried() {
        let calls = Mutex::new(0);

        let result: Result<()> = with_permission_fallback("sc-domain:example.com", |_site| {
            *calls.lock().unwrap() += 1;
            async { Err(InsightsError::from_status(Some(403), "permission denied")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
