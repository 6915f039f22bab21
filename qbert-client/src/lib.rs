//! Crate for interacting with the Platform9 Keystone and Qbert APIs
//!
//! Keystone issues the bearer token, Qbert manages clusters, nodes and
//! cloud providers with it. Every method is one request (name-based helpers do
//! a lookup first) and hands back the decoded JSON.
//!
//! # Example
//!
//! ```rust,no_run
//! use qbert_client::{keystone::{Credentials, Keystone}, Qbert};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("du.example.com", "admin@example.com", "secret", "service");
//!     let mut keystone = Keystone::new(credentials)?;
//!     let token = keystone.authenticate().await?;
//!
//!     let qbert = Qbert::new(token, "https://du.example.com/qbert/v4/<project-id>")?;
//!     for (name, cluster) in qbert.list_clusters_by_name().await? {
//!         println!("found cluster {} ({})", name, cluster["uuid"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For more details, see:
//!
//! - [`Client`](crate::client) for the underlying HTTP client and its layers
//! - [`Config`](crate::config) for timeouts, retries and TLS
//! - [`Keystone`](crate::keystone::Keystone) for authentication
//! - [`Qbert`](crate::Qbert) for the control-plane operations
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod keystone;

#[doc(inline)]
pub use api::{NodeAttachment, Qbert};
#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use config::Config;

pub mod error;
#[doc(inline)] pub use error::Error;
/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-exports from qbert_core
pub use qbert_core as core;
