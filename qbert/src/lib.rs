//! Qbert is an umbrella-crate for talking to the [Platform9](https://platform9.com) management plane in Rust.
//!
//! # Overview
//!
//! A data unit (DU) serves two APIs: Keystone, which issues tokens, and Qbert,
//! which manages cloud providers, clusters and nodes. This crate re-exports:
//!
//! - [`keystone`](crate::keystone) with [`Keystone`](crate::keystone::Keystone) for authentication
//! - [`api`](crate::api) with the [`Qbert`](crate::Qbert) control-plane client
//! - [`client`](crate::client) with the HTTP [`Client`](crate::Client) and its layers
//! - [`config`](crate::config) for transport [`Config`](crate::Config)
//! - [`core`](crate::core) with the client-less request builders and helpers
//!
//! # Using the Client
//! ```no_run
//! use qbert::{keystone::{Credentials, Keystone}, NodeAttachment, Qbert};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("du.example.com", "admin@example.com", "secret", "service");
//!     let mut keystone = Keystone::new(credentials)?;
//!     let token = keystone.authenticate().await?;
//!     let project = keystone.resolve_project_id("service").await?.ok_or("no such project")?;
//!
//!     let qbert = Qbert::new(token, &format!("https://du.example.com/qbert/v4/{project}"))?;
//!     qbert
//!         .attach_nodes(&[NodeAttachment::master("node-1"), NodeAttachment::worker("node-2")], "prod")
//!         .await?;
//!     println!("prod is served on {}", qbert.get_master_ip_by_name("prod").await?);
//!     Ok(())
//! }
//! ```
//!
//! For details, see:
//!
//! - [`Qbert`](crate::Qbert) for every control-plane operation
//! - [`Client`](crate::client) for the retrying, tracing HTTP client

pub use qbert_client::{api, client, config, error, keystone};

#[doc(inline)] pub use api::{NodeAttachment, Qbert};
#[doc(inline)] pub use client::Client;
#[doc(inline)] pub use config::Config;
#[doc(inline)] pub use error::Error;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-exports from qbert_core
pub use qbert_core as core;
