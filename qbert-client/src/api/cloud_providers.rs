use qbert_core::{request::to_body, Request};
use serde_json::Value;

use super::{Qbert, CLOUD_PROVIDERS};
use crate::Result;

/// Cloud provider accounts
impl Qbert {
    /// Get the details of the cloud provider account `uuid`
    pub async fn get_cloud_provider(&self, uuid: &str) -> Result<Value> {
        tracing::debug!("Getting cloud provider {}", uuid);
        self.send_json(Request::new(CLOUD_PROVIDERS).get(uuid)).await
    }

    /// Get the details of `region` in the cloud provider account `uuid`
    pub async fn get_cloud_provider_region_info(&self, uuid: &str, region: &str) -> Result<Value> {
        tracing::debug!("Getting cloud provider region info for {} in {}", uuid, region);
        let subresource = format!("region/{region}");
        self.send_json(Request::new(CLOUD_PROVIDERS).get_subresource(uuid, &subresource))
            .await
    }

    /// List cloud provider accounts
    pub async fn list_cloud_providers(&self) -> Result<Vec<Value>> {
        tracing::debug!("Listing cloud providers");
        self.list_at(CLOUD_PROVIDERS).await
    }

    /// List the kinds of cloud provider that can be created
    ///
    /// The body is returned as sent.
    pub async fn list_cloud_provider_types(&self) -> Result<Value> {
        tracing::debug!("Listing cloud provider types");
        self.send_json(Request::new("/cloudProvider/types").list()).await
    }

    /// Create a cloud provider account
    ///
    /// The response carries the `uuid` of the new account.
    pub async fn create_cloud_provider(&self, body: &Value) -> Result<Value> {
        let name = body.get("name").unwrap_or(&Value::Null);
        tracing::debug!("Creating cloud provider {}", name);
        self.send_json(to_body(body).and_then(|data| Request::new(CLOUD_PROVIDERS).create(data)))
            .await
    }

    /// Update the cloud provider account `uuid`
    ///
    /// `name` and `type` are required in `body` whatever the provider.
    pub async fn update_cloud_provider(&self, uuid: &str, body: &Value) -> Result<Value> {
        tracing::debug!("Updating cloud provider {}", uuid);
        self.send_json(to_body(body).and_then(|data| Request::new(CLOUD_PROVIDERS).replace(uuid, data)))
            .await
    }

    /// Delete the cloud provider account `uuid`
    pub async fn delete_cloud_provider(&self, uuid: &str) -> Result<Value> {
        tracing::debug!("Deleting cloud provider {}", uuid);
        self.send_json(Request::new(CLOUD_PROVIDERS).delete(uuid)).await
    }
}
