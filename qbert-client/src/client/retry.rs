//! Retry policy for transient gateway failures.
//!
//! This module provides a [`RetryPolicy`] that implements [`tower::retry::Policy`]
//! for retrying requests that failed with a bad gateway, unavailable or gateway
//! timeout status, with exponential backoff.
//!
//! The default [`Client`](crate::Client) stack already includes it, configured from
//! [`Config`](crate::Config):
//!
//! ```no_run
//! use qbert_client::{client::retry::RetryPolicy, Config};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::from_url("https://du.example.com/qbert/v4/p1")?;
//! config.max_retries = 3;
//! let policy = RetryPolicy::from_config(&config)?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use http::{Request, Response, StatusCode};
use tower::{
    retry::{
        backoff::{Backoff, ExponentialBackoff, ExponentialBackoffMaker, MakeBackoff},
        Policy,
    },
    util::rng::HasherRng,
};

use super::Body;
use crate::Config;

/// Backoff configuration validation error.
pub use tower::retry::backoff::InvalidBackoff;

/// A retry policy for Qbert and Keystone requests.
///
/// This policy retries requests that fail with:
/// - 502 Bad Gateway
/// - 503 Service Unavailable
/// - 504 Gateway Timeout
///
/// Uses exponential backoff starting from `min_delay` up to `max_delay`,
/// with a configurable maximum number of retries. Every other outcome,
/// including transport errors, is passed through untouched.
#[derive(Clone)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
    current_attempt: u32,
    max_retries: u32,
}

impl RetryPolicy {
    /// Create a new retry policy with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `min_delay` - Initial delay between retries
    /// * `max_delay` - Maximum delay between retries (cap for exponential growth)
    /// * `max_retries` - Maximum number of retry attempts
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBackoff`] if the backoff parameters are invalid.
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: u32) -> Result<Self, InvalidBackoff> {
        let backoff =
            ExponentialBackoffMaker::new(min_delay, max_delay, 0.5, HasherRng::new())?.make_backoff();

        Ok(Self {
            backoff,
            current_attempt: 0,
            max_retries,
        })
    }

    /// Create the policy described by a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, InvalidBackoff> {
        Self::new(config.min_backoff, config.max_backoff, config.max_retries)
    }

    /// Check if the status code is retryable.
    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        )
    }
}

impl Default for RetryPolicy {
    /// Create a default retry policy.
    ///
    /// Default parameters:
    /// - `min_delay`: 1s
    /// - `max_delay`: 120s
    /// - `max_retries`: 10
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(120), 10)
            .expect("default RetryPolicy parameters are valid")
    }
}

impl<Res, E> Policy<Request<Body>, Response<Res>, E> for RetryPolicy {
    type Future = tokio::time::Sleep;

    fn retry(&mut self, req: &mut Request<Body>, result: &mut Result<Response<Res>, E>) -> Option<Self::Future> {
        match result {
            Ok(response)
                if Self::is_retryable_status(response.status()) && self.current_attempt < self.max_retries =>
            {
                self.current_attempt += 1;
                tracing::debug!(
                    "retrying {} {} after status {} (attempt {}/{})",
                    req.method(),
                    req.uri(),
                    response.status(),
                    self.current_attempt,
                    self.max_retries
                );
                Some(self.backoff.next_backoff())
            }
            _ => None,
        }
    }

    fn clone_request(&mut self, req: &Request<Body>) -> Option<Request<Body>> {
        // Only fully buffered bodies can be replayed
        let body = req.body().try_clone()?;

        let mut builder = Request::builder()
            .method(req.method().clone())
            .uri(req.uri().clone())
            .version(req.version());

        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers().clone());
        }

        builder.body(body).ok().map(|mut new_req| {
            *new_req.extensions_mut() = req.extensions().clone();
            new_req
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 10);
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = Config::from_url("https://du.example.com").unwrap();
        config.max_retries = 2;
        assert_eq!(RetryPolicy::from_config(&config).unwrap().max_retries, 2);
    }

    #[test]
    fn test_retryable_status() {
        assert!(RetryPolicy::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(RetryPolicy::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(RetryPolicy::is_retryable_status(StatusCode::GATEWAY_TIMEOUT));

        assert!(!RetryPolicy::is_retryable_status(StatusCode::OK));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!RetryPolicy::is_retryable_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_invalid_backoff() {
        let result = RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(1), 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_request_keeps_body_and_headers() {
        let mut policy = RetryPolicy::default();
        let req = Request::post("/clusters/c1/upgrade")
            .header("x-auth-token", "tok")
            .body(Body::from(b"{\"batchUpgradePercent\":100}".to_vec()))
            .unwrap();
        let cloned = <RetryPolicy as Policy<Request<Body>, Response<Body>, ()>>::clone_request(&mut policy, &req)
            .expect("buffered request is clonable");
        assert_eq!(cloned.method(), http::Method::POST);
        assert_eq!(cloned.uri(), "/clusters/c1/upgrade");
        assert_eq!(cloned.headers().get("x-auth-token").unwrap(), "tok");
    }
}
