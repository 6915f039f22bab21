use std::collections::BTreeMap;

use qbert_core::{
    kubeconfig::{embed, KubeconfigCredential},
    request::to_body,
    Request,
};
use serde_json::{json, Value};

use super::{string_at, NodeAttachment, Qbert, CLUSTERS, NODES};
use crate::{Error, Result};

/// Clusters and their membership
impl Qbert {
    /// List clusters
    pub async fn list_clusters(&self) -> Result<Vec<Value>> {
        tracing::debug!("Listing clusters");
        self.list_at(CLUSTERS).await
    }

    /// List clusters keyed by `uuid`
    ///
    /// ```no_run
    /// # async fn wrapper(qbert: qbert_client::Qbert) -> Result<(), Box<dyn std::error::Error>> {
    /// let clusters = qbert.list_clusters_by_uuid().await?;
    /// if let Some(cluster) = clusters.get("6ca8b4c9-3b4f-4b37-9a47-1d9f6c1fa1c3") {
    ///     println!("{}", cluster["name"]);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_clusters_by_uuid(&self) -> Result<BTreeMap<String, Value>> {
        tracing::debug!("Listing clusters by uuid");
        self.list_keyed(CLUSTERS, "uuid").await
    }

    /// List clusters keyed by `name`
    pub async fn list_clusters_by_name(&self) -> Result<BTreeMap<String, Value>> {
        tracing::debug!("Listing clusters by name");
        self.list_keyed(CLUSTERS, "name").await
    }

    /// Get the cluster `uuid`
    pub async fn get_cluster(&self, uuid: &str) -> Result<Value> {
        tracing::debug!("Getting cluster {}", uuid);
        self.send_json(Request::new(CLUSTERS).get(uuid)).await
    }

    /// Create a cluster
    ///
    /// The response carries the `uuid` of the new cluster.
    pub async fn create_cluster(&self, body: &Value) -> Result<Value> {
        let name = body.get("name").unwrap_or(&Value::Null);
        tracing::debug!("Creating cluster {}", name);
        self.send_json(to_body(body).and_then(|data| Request::new(CLUSTERS).create(data)))
            .await
    }

    /// Update the cluster `uuid`
    pub async fn update_cluster(&self, uuid: &str, body: &Value) -> Result<Value> {
        tracing::debug!("Updating cluster {}", uuid);
        self.send_json(to_body(body).and_then(|data| Request::new(CLUSTERS).replace(uuid, data)))
            .await
    }

    /// Delete the cluster `uuid`
    pub async fn delete_cluster(&self, uuid: &str) -> Result<Value> {
        tracing::debug!("Deleting cluster {}", uuid);
        self.send_json(Request::new(CLUSTERS).delete(uuid)).await
    }

    /// Delete the cluster called `name`
    ///
    /// The name is resolved first; a cluster renamed or removed in between
    /// surfaces as whatever error the delete itself returns.
    pub async fn delete_cluster_by_name(&self, name: &str) -> Result<Value> {
        tracing::debug!("Deleting cluster by name {}", name);
        let uuid = self.uuid_by_name("cluster", CLUSTERS, name).await?;
        self.delete_cluster(&uuid).await
    }

    /// Attach nodes to the cluster called `cluster_name`, each with its role
    ///
    /// Sends `[{"uuid": .., "isMaster": ..}, ..]` to `/clusters/{uuid}/attach`.
    pub async fn attach_nodes(&self, nodes: &[NodeAttachment], cluster_name: &str) -> Result<Value> {
        tracing::debug!("Attaching nodes {:?} to cluster {}", nodes, cluster_name);
        let by_name = self.list_keyed(NODES, "name").await?;
        let body = nodes
            .iter()
            .map(|node| {
                let uuid = node_uuid(&by_name, &node.node_name)?;
                Ok(json!({ "uuid": uuid, "isMaster": node.is_master }))
            })
            .collect::<Result<Vec<_>>>()?;
        let cluster_uuid = self.uuid_by_name("cluster", CLUSTERS, cluster_name).await?;
        self.post_to_cluster(&cluster_uuid, "attach", &body).await
    }

    /// Attach nodes to the cluster called `cluster_name`, letting Qbert pick roles
    ///
    /// Sends a plain array of node uuids to `/clusters/{uuid}/attach`.
    pub async fn attach_nodes_v2<S: AsRef<str>>(&self, node_names: &[S], cluster_name: &str) -> Result<Value> {
        let names = node_names.iter().map(AsRef::as_ref).collect::<Vec<_>>();
        tracing::debug!("Attaching nodes {:?} to cluster {}", names, cluster_name);
        let by_name = self.list_keyed(NODES, "name").await?;
        let body = names
            .iter()
            .map(|name| node_uuid(&by_name, name).map(Value::String))
            .collect::<Result<Vec<_>>>()?;
        let cluster_uuid = self.uuid_by_name("cluster", CLUSTERS, cluster_name).await?;
        self.post_to_cluster(&cluster_uuid, "attach", &body).await
    }

    /// Detach the node called `node_name` from the cluster called `cluster_name`
    pub async fn detach_node(&self, node_name: &str, cluster_name: &str) -> Result<Value> {
        tracing::debug!("Detaching node {} from cluster {}", node_name, cluster_name);
        let node_uuid = self.uuid_by_name("node", NODES, node_name).await?;
        let cluster_uuid = self.uuid_by_name("cluster", CLUSTERS, cluster_name).await?;
        let body = vec![json!({ "uuid": node_uuid })];
        self.post_to_cluster(&cluster_uuid, "detach", &body).await
    }

    /// Upgrade every node of the cluster `uuid` in one batch
    pub async fn upgrade_cluster(&self, uuid: &str) -> Result<Value> {
        tracing::debug!("Upgrading cluster {}", uuid);
        let body = json!({ "batchUpgradePercent": 100 });
        self.send_json(to_body(&body).and_then(|data| Request::new(CLUSTERS).post_subresource(uuid, "upgrade", data)))
            .await
    }

    /// Trigger an upgrade of every cluster that has one pending
    pub async fn trigger_omniupgrade(&self) -> Result<Value> {
        tracing::debug!("Triggering omniupgrade");
        self.send_json(Request::new("/omniupgrade").trigger()).await
    }

    /// The `masterIp` of the cluster `uuid`
    pub async fn get_master_ip(&self, uuid: &str) -> Result<String> {
        tracing::debug!("Getting masterIp for cluster {}", uuid);
        let cluster = self.get_cluster(uuid).await?;
        string_at(&cluster, "masterIp")
    }

    /// The `masterIp` of the cluster called `name`
    pub async fn get_master_ip_by_name(&self, name: &str) -> Result<String> {
        let uuid = self.uuid_by_name("cluster", CLUSTERS, name).await?;
        self.get_master_ip(&uuid).await
    }

    /// Fetch the kubeconfig of the cluster `uuid` with a credential filled in
    ///
    /// With both `username` and `password` the kubeconfig carries them as a
    /// base64 encoded JSON document; otherwise it carries this client's token.
    ///
    /// ```no_run
    /// # async fn wrapper(qbert: qbert_client::Qbert) -> Result<(), Box<dyn std::error::Error>> {
    /// let kubeconfig = qbert.get_kubeconfig("6ca8b4c9", Some("admin@example.com"), Some("secret")).await?;
    /// std::fs::write("kubeconfig.yaml", kubeconfig)?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_kubeconfig(
        &self,
        uuid: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String> {
        tracing::debug!("Getting kubeconfig for cluster {}", uuid);
        let document = self.send_text(Request::new("/kubeconfig").get(uuid)).await?;
        let credential = KubeconfigCredential::from_parts(self.token(), username, password);
        Ok(embed(&document, &credential))
    }

    /// [`Qbert::get_kubeconfig`] for the cluster called `name`
    pub async fn get_kubeconfig_by_name(
        &self,
        name: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String> {
        let uuid = self.uuid_by_name("cluster", CLUSTERS, name).await?;
        self.get_kubeconfig(&uuid, username, password).await
    }

    /// Get a web CLI token for the cluster `uuid`
    pub async fn get_cli_token(&self, uuid: &str) -> Result<String> {
        tracing::debug!("Getting cli token for cluster {}", uuid);
        let response = self
            .send_json(Request::new(format!("/webcli/{uuid}")).trigger())
            .await?;
        string_at(&response, "token")
    }

    async fn post_to_cluster(&self, cluster_uuid: &str, action: &str, body: &[Value]) -> Result<Value> {
        self.send_json(to_body(body).and_then(|data| Request::new(CLUSTERS).post_subresource(cluster_uuid, action, data)))
            .await
    }
}

fn node_uuid(by_name: &BTreeMap<String, Value>, name: &str) -> Result<String> {
    let node = by_name.get(name).ok_or_else(|| Error::NameNotFound {
        kind: "node",
        name: name.to_string(),
    })?;
    string_at(node, "uuid")
}
