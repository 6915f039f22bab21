//! Error handling in [`qbert`][crate]
use http::StatusCode;
use thiserror::Error;

pub use qbert_core::{ErrorResponse, KeyPathError};

/// Possible errors when working with [`qbert`][crate]
#[derive(Error, Debug)]
pub enum Error {
    /// ApiError for when Qbert answers with an `error` document
    ///
    /// Raised whenever a JSON response carries a top-level `error` field,
    /// regardless of the status code it came with.
    #[error("ApiError: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// Non-success status without an `error` document
    ///
    /// This is also what remains when retries on 502/503/504 are exhausted.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// The final status code
        status: StatusCode,
        /// The response body as text
        body: String,
    },

    /// Service error
    #[error("ServiceError: {0}")]
    Service(#[source] tower::BoxError),

    /// UTF-8 Error
    #[error("UTF-8 Error: {0}")]
    FromUtf8(#[source] std::string::FromUtf8Error),

    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[source] http::Error),

    /// Common error case when requesting parsing into own structs
    #[error("Error deserializing response: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// Failed to build request
    #[error("Failed to build request: {0}")]
    BuildRequest(#[source] qbert_core::Error),

    /// A record lacked a field needed to key or chain on it
    #[error("Key path error: {0}")]
    KeyPath(#[source] KeyPathError),

    /// A name-based operation found no resource with that name
    #[error("No {kind} named '{name}'")]
    NameNotFound {
        /// The kind of resource looked up, e.g. `cluster`
        kind: &'static str,
        /// The name that was looked up
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[source] ConfigError),

    /// Errors related to client auth
    #[error("auth error: {0}")]
    Auth(#[source] AuthError),
}

#[derive(Error, Debug)]
// Redundant with the error messages and machine names
#[allow(missing_docs)]
/// Possible errors when constructing clients
pub enum ConfigError {
    #[error("A Keystone token is required")]
    MissingToken,

    #[error("An API url is required")]
    MissingApiUrl,

    #[error("API url must not have a trailing slash: {0}")]
    TrailingSlash(String),

    #[error("Invalid API url '{url}': {source}")]
    InvalidUri {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("Invalid value '{value}' for {name}: {source}")]
    InvalidTimeout {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Token is not a valid header value: {0}")]
    InvalidHeaderValue(#[source] http::header::InvalidHeaderValue),

    #[error("Invalid retry backoff: {0}")]
    InvalidBackoff(#[source] tower::retry::backoff::InvalidBackoff),

    #[error("Failed to set up TLS: {0}")]
    Tls(#[source] std::io::Error),
}

#[derive(Error, Debug)]
/// Keystone authentication errors
pub enum AuthError {
    /// Keystone refused the credentials
    #[error("Keystone rejected authentication with status {status}")]
    Rejected {
        /// Status code of the rejection
        status: StatusCode,
        /// Message from Keystone's error document, if it sent one
        message: Option<String>,
    },

    /// The token response had no usable `X-Subject-Token` header
    #[error("Keystone response did not carry an X-Subject-Token header")]
    MissingSubjectToken,

    /// An operation needing a token ran before `authenticate`
    #[error("not authenticated, call authenticate first")]
    NotAuthenticated,
}
