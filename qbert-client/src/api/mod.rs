//! API helpers for the Qbert control plane
//!
//! [`Qbert`] wraps a [`Client`] rooted at a project's Qbert url
//! (`https://{du_fqdn}/qbert/v4/{project_id}`) and exposes one method per
//! endpoint. Resource records stay untyped [`serde_json::Value`]s.
use std::collections::BTreeMap;

use qbert_core::{keyed_list_to_map, value_at_path, KeyPathError, Request};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::{error::ConfigError, Client, Config, Error, Result};

mod cloud_providers;
mod clusters;
mod nodes;

pub(crate) const CLOUD_PROVIDERS: &str = "/cloudProviders";
pub(crate) const CLUSTERS: &str = "/clusters";
pub(crate) const NODES: &str = "/nodes";

/// A node to attach, by name, and the role it takes in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttachment {
    /// Name of the node as listed by `GET /nodes`
    pub node_name: String,
    /// Whether the node joins as a master
    pub is_master: bool,
}

impl NodeAttachment {
    /// Attach `node_name` as a worker
    pub fn worker(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            is_master: false,
        }
    }

    /// Attach `node_name` as a master
    pub fn master(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            is_master: true,
        }
    }
}

/// The Qbert client to Platform9's managed Kubernetes product
///
/// Every request carries the Keystone token as `X-Auth-Token`.
/// Gateway errors are retried according to the [`Config`] it was built from.
#[derive(Clone)]
pub struct Qbert {
    client: Client,
    token: SecretString,
    api_url: String,
}

impl Qbert {
    /// Create a client for `api_url` presenting `token`, with default settings
    ///
    /// Fails without any I/O if the token or url is empty, or the url ends in `/`.
    /// Must be called within a tokio runtime.
    pub fn new(token: impl Into<SecretString>, api_url: &str) -> Result<Self> {
        let token = token.into();
        let config = validate(&token, api_url)?.with_token(token.clone())?;
        Ok(Self {
            client: Client::try_from(config)?,
            token,
            api_url: api_url.to_string(),
        })
    }

    /// Create a client from a [`Config`] that carries a token
    ///
    /// The url is checked like in [`Qbert::new`], so a bare host, which
    /// renders as `https://host/`, is rejected too. See [`Config::with_token`].
    pub fn with_config(config: Config) -> Result<Self> {
        let token = config
            .auth_token
            .clone()
            .ok_or(Error::Config(ConfigError::MissingToken))?;
        let api_url = config.api_url.to_string();
        validate(&token, &api_url)?;
        Ok(Self {
            client: Client::try_from(config)?,
            token,
            api_url,
        })
    }

    /// Use an existing [`Client`] that already sends `token`
    ///
    /// `token` and `api_url` are validated like in [`Qbert::new`]; the token is
    /// still needed to embed into kubeconfigs.
    pub fn from_client(client: Client, token: impl Into<SecretString>, api_url: &str) -> Result<Self> {
        let token = token.into();
        validate(&token, api_url)?;
        Ok(Self {
            client,
            token,
            api_url: api_url.to_string(),
        })
    }

    /// The API root requests are sent to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub(crate) async fn send_json(&self, request: qbert_core::Result<http::Request<Vec<u8>>>) -> Result<Value> {
        let request = request.map_err(Error::BuildRequest)?;
        self.client.request_json(request).await
    }

    pub(crate) async fn send_text(&self, request: qbert_core::Result<http::Request<Vec<u8>>>) -> Result<String> {
        let request = request.map_err(Error::BuildRequest)?;
        self.client.request_text(request).await
    }

    pub(crate) async fn list_at(&self, path: &str) -> Result<Vec<Value>> {
        let request = Request::new(path).list().map_err(Error::BuildRequest)?;
        self.client.request(request).await
    }

    pub(crate) async fn list_keyed(&self, path: &str, key: &str) -> Result<BTreeMap<String, Value>> {
        let records = self.list_at(path).await?;
        keyed_list_to_map(&records, key).map_err(Error::KeyPath)
    }

    /// Resolve the `uuid` of the record at `path` called `name`
    pub(crate) async fn uuid_by_name(&self, kind: &'static str, path: &str, name: &str) -> Result<String> {
        let by_name = self.list_keyed(path, "name").await?;
        let record = by_name.get(name).ok_or_else(|| Error::NameNotFound {
            kind,
            name: name.to_string(),
        })?;
        string_at(record, "uuid")
    }
}

fn validate(token: &SecretString, api_url: &str) -> Result<Config> {
    if token.expose_secret().is_empty() {
        return Err(Error::Config(ConfigError::MissingToken));
    }
    Config::from_url(api_url)
}

/// Read a string field, failing on absent or non-string values
pub(crate) fn string_at(record: &Value, path: &str) -> Result<String> {
    match value_at_path(record, path).map_err(Error::KeyPath)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(Error::KeyPath(KeyPathError::InvalidKey {
            path: path.to_string(),
            value: other.clone(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn construction_validates_before_io() {
        assert!(matches!(
            Qbert::new("", "https://du.example.com/qbert/v4/p1"),
            Err(Error::Config(ConfigError::MissingToken))
        ));
        assert!(matches!(
            Qbert::new("tok", ""),
            Err(Error::Config(ConfigError::MissingApiUrl))
        ));
        assert!(matches!(
            Qbert::new("tok", "https://du.example.com/qbert/v4/p1/"),
            Err(Error::Config(ConfigError::TrailingSlash(_)))
        ));
        let qbert = Qbert::new("tok", "https://du.example.com/qbert/v4/p1").unwrap();
        assert_eq!(qbert.api_url(), "https://du.example.com/qbert/v4/p1");
    }

    #[tokio::test]
    async fn with_config_needs_a_token() {
        let config = Config::from_url("https://du.example.com/qbert/v4/p1").unwrap();
        assert!(matches!(
            Qbert::with_config(config.clone()),
            Err(Error::Config(ConfigError::MissingToken))
        ));
        let qbert = Qbert::with_config(config.with_token("tok").unwrap()).unwrap();
        assert_eq!(qbert.api_url(), "https://du.example.com/qbert/v4/p1");
        assert_eq!(qbert.token(), "tok");
    }

    #[tokio::test]
    async fn with_config_rejects_trailing_slash() {
        let uri = "https://du.example.com/qbert/v4/p1/".parse::<http::Uri>().unwrap();
        let config = Config::new(uri).with_token("tok").unwrap();
        match Qbert::with_config(config) {
            Err(Error::Config(ConfigError::TrailingSlash(url))) => {
                assert_eq!(url, "https://du.example.com/qbert/v4/p1/")
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(qbert) => panic!("accepted {}", qbert.api_url()),
        }
    }

    #[test]
    fn string_fields() {
        let cluster = json!({"uuid": "c1", "masterIp": "10.0.0.1", "nodes": 3});
        assert_eq!(string_at(&cluster, "masterIp").unwrap(), "10.0.0.1");
        assert!(matches!(
            string_at(&cluster, "nodes"),
            Err(Error::KeyPath(KeyPathError::InvalidKey { .. }))
        ));
        assert!(matches!(
            string_at(&cluster, "token"),
            Err(Error::KeyPath(KeyPathError::Missing { .. }))
        ));
    }
}
