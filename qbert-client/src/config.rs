//! Client configuration: API root, timeouts, retry bounds and TLS verification
//!
//! # Usage
//! Construct a [`Config`] from an API url with [`Config::from_url`], adjust the
//! public fields as needed and pass it to a [`Client`][crate::Client],
//! [`Qbert`][crate::Qbert] or [`Keystone`][crate::keystone::Keystone].
//!
//! Nothing here reads the process environment implicitly;
//! call [`Config::apply_env`] where the environment should win.
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::{error::ConfigError, Error, Result};

/// Environment variable overriding [`Config::timeout`], in whole seconds
pub const TIMEOUT_ENV: &str = "HTTP_REQUEST_TIMEOUT_IN_SECS";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Default number of retries on 502, 503 and 504
pub const DEFAULT_MAX_RETRIES: u32 = 10;

const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Configuration object detailing the API url, timeouts, retries and TLS behaviour.
///
/// It exists to be consumed by the [`Client`][crate::Client].
#[derive(Debug, Clone)]
pub struct Config {
    /// The API root every request path is appended to
    pub api_url: http::Uri,
    /// Timeout for connecting and for each read from the server
    ///
    /// A value of `None` means no timeout
    pub timeout: Option<Duration>,
    /// How many times a 502, 503 or 504 is retried before it is surfaced
    pub max_retries: u32,
    /// Delay before the first retry
    pub min_backoff: Duration,
    /// Upper bound of the exponentially growing retry delay
    pub max_backoff: Duration,
    /// Whether to accept invalid certificates
    pub accept_invalid_certs: bool,
    /// Token sent as `X-Auth-Token` on every request
    pub(crate) auth_token: Option<SecretString>,
}

impl Config {
    /// Construct a new config where only the `api_url` is set by the user
    /// and everything else receives a default value.
    pub fn new(api_url: http::Uri) -> Self {
        Self {
            api_url,
            timeout: Some(DEFAULT_TIMEOUT),
            max_retries: DEFAULT_MAX_RETRIES,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            accept_invalid_certs: false,
            auth_token: None,
        }
    }

    /// Validate and parse `api_url`, then construct a default config for it.
    ///
    /// The url must be non-empty and must not end in `/`.
    pub fn from_url(api_url: &str) -> Result<Self> {
        if api_url.is_empty() {
            return Err(Error::Config(ConfigError::MissingApiUrl));
        }
        if api_url.ends_with('/') {
            return Err(Error::Config(ConfigError::TrailingSlash(api_url.to_string())));
        }
        let uri = api_url.parse::<http::Uri>().map_err(|source| {
            Error::Config(ConfigError::InvalidUri {
                url: api_url.to_string(),
                source,
            })
        })?;
        Ok(Self::new(uri))
    }

    /// Send `token` as `X-Auth-Token` on every request
    pub fn with_token(mut self, token: impl Into<SecretString>) -> Result<Self> {
        let token = token.into();
        if token.expose_secret().is_empty() {
            return Err(Error::Config(ConfigError::MissingToken));
        }
        self.auth_token = Some(token);
        Ok(self)
    }

    /// Override the timeout from [`TIMEOUT_ENV`] if it is set
    pub fn apply_env(self) -> Result<Self> {
        self.apply_timeout_override(std::env::var(TIMEOUT_ENV).ok().as_deref())
    }

    fn apply_timeout_override(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(raw) = value {
            let secs = raw.trim().parse::<u64>().map_err(|source| {
                Error::Config(ConfigError::InvalidTimeout {
                    name: TIMEOUT_ENV,
                    value: raw.to_string(),
                    source,
                })
            })?;
            tracing::debug!("request timeout set to {}s from {}", secs, TIMEOUT_ENV);
            self.timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::matches;

    #[test]
    fn defaults() {
        let config = Config::from_url("https://du.example.com/qbert/v4/p1").unwrap();
        assert_eq!(config.api_url, "https://du.example.com/qbert/v4/p1");
        assert_eq!(config.timeout, Some(Duration::from_secs(180)));
        assert_eq!(config.max_retries, 10);
        assert!(!config.accept_invalid_certs);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn url_validation() {
        assert!(matches!(
            Config::from_url(""),
            Err(Error::Config(ConfigError::MissingApiUrl))
        ));
        assert!(matches!(
            Config::from_url("https://du.example.com/qbert/v4/"),
            Err(Error::Config(ConfigError::TrailingSlash(_)))
        ));
        assert!(matches!(
            Config::from_url("https://du example"),
            Err(Error::Config(ConfigError::InvalidUri { .. }))
        ));
    }

    #[test]
    fn empty_token_rejected() {
        let config = Config::from_url("https://du.example.com").unwrap();
        assert!(matches!(
            config.clone().with_token(""),
            Err(Error::Config(ConfigError::MissingToken))
        ));
        assert!(config.with_token("abc").unwrap().auth_token.is_some());
    }

    #[test]
    fn timeout_override() {
        let config = Config::from_url("https://du.example.com").unwrap();
        let config = config.apply_timeout_override(Some("30")).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        let unchanged = config.clone().apply_timeout_override(None).unwrap();
        assert_eq!(unchanged.timeout, Some(Duration::from_secs(30)));

        assert!(matches!(
            config.apply_timeout_override(Some("soon")),
            Err(Error::Config(ConfigError::InvalidTimeout { .. }))
        ));
    }
}
