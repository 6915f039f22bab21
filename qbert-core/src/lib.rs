//! Crate with types and behavior necessary for talking to the Keystone and Qbert APIs
//!
//! This crate is available as a minimal alternative to `qbert` where a client is not available.
//! It builds [`http::Request`] values and interprets response bodies, but never performs I/O.
//! The same information here is always re-exported from `qbert` under `qbert::core`.
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod dict;
pub use dict::{keyed_list_to_map, value_at_path, KeyPathError};

pub mod identity;

pub mod kubeconfig;

pub mod request;
pub use request::Request;

mod error;
pub use error::{Error, ErrorResponse};

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
