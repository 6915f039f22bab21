use std::collections::BTreeMap;

use qbert_core::{request::to_body, Request};
use serde_json::{json, Value};

use super::{Qbert, NODES};
use crate::Result;

/// Nodes and node pools
impl Qbert {
    /// List node pools
    pub async fn list_nodepools(&self) -> Result<Vec<Value>> {
        tracing::debug!("Listing node pools");
        self.list_at("/nodePools").await
    }

    /// List nodes
    pub async fn list_nodes(&self) -> Result<Vec<Value>> {
        tracing::debug!("Listing nodes");
        self.list_at(NODES).await
    }

    /// List nodes keyed by `uuid`
    pub async fn list_nodes_by_uuid(&self) -> Result<BTreeMap<String, Value>> {
        tracing::debug!("Listing nodes by uuid");
        self.list_keyed(NODES, "uuid").await
    }

    /// List nodes keyed by `name`
    pub async fn list_nodes_by_name(&self) -> Result<BTreeMap<String, Value>> {
        tracing::debug!("Listing nodes by name");
        self.list_keyed(NODES, "name").await
    }

    /// Detach the node called `node_name` from whatever cluster it is in
    ///
    /// Sends `PUT /nodes/{uuid}` with `{"cluster_uuid": null}`.
    pub async fn detach_node_v2(&self, node_name: &str) -> Result<Value> {
        tracing::debug!("Detaching node {} from its cluster", node_name);
        let node_uuid = self.uuid_by_name("node", NODES, node_name).await?;
        let body = json!({ "cluster_uuid": null });
        self.send_json(to_body(&body).and_then(|data| Request::new(NODES).replace(&node_uuid, data)))
            .await
    }

    /// Fetch the kubelet log of the node called `node_name` as text
    pub async fn get_kubelog(&self, node_name: &str) -> Result<String> {
        tracing::debug!("Requesting kube log from node {}", node_name);
        let node_uuid = self.uuid_by_name("node", NODES, node_name).await?;
        self.send_text(Request::new("/LOGs").get(&node_uuid)).await
    }
}
