//! The remote graph service API client.
//!
//! [`GraphApi`] is the trait seam the connector and scheduler consume;
//! [`HttpGraphApi`] is the production implementation over reqwest. Tests
//! substitute stubs for the trait.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use chatgraph_core::id::RemoteId;
use chatgraph_core::remote::GraphDump;
use chatgraph_core::signal::{NodeProperties, Relation, Signal};

use crate::error::SyncError;
use crate::queue::JobOutcome;

/// Response of the collaborative-filtering endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollabFilterResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Suggestion {
    pub node: SuggestionNode,
}

/// The node inside a suggestion. Everything is optional; entries without a
/// usable `channel_id` are discarded by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionNode {
    #[serde(default)]
    pub id: Option<RemoteId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: NodeProperties,
}

/// Read and write access to the remote graph service.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetches the full node/edge dump of a graph.
    async fn fetch_graph(&self, graph_id: &str) -> Result<GraphDump, SyncError>;

    /// Executes a batch of mutation signals against a graph, returning the
    /// executed signals with their remote-assigned identifiers.
    async fn apply_signals(
        &self,
        graph_id: &str,
        signals: &[Signal],
    ) -> Result<JobOutcome, SyncError>;

    /// Collaborative-filtering query: nodes related to `from` through the
    /// `via` relation, ranked by the remote service.
    async fn collab_filter(
        &self,
        graph_id: &str,
        from: &RemoteId,
        via: Relation,
    ) -> Result<CollabFilterResponse, SyncError>;
}

/// HTTP implementation of [`GraphApi`].
pub struct HttpGraphApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGraphApi {
    /// `base_url` is the API root, e.g. `https://graphcommons.com/api/v1`.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        HttpGraphApi {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GraphApi for HttpGraphApi {
    async fn fetch_graph(&self, graph_id: &str) -> Result<GraphDump, SyncError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/graphs/{}", graph_id))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn apply_signals(
        &self,
        graph_id: &str,
        signals: &[Signal],
    ) -> Result<JobOutcome, SyncError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/graphs/{}/add", graph_id))
            .json(&json!({ "signals": signals }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn collab_filter(
        &self,
        graph_id: &str,
        from: &RemoteId,
        via: Relation,
    ) -> Result<CollabFilterResponse, SyncError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/graphs/{}/collab_filter", graph_id),
            )
            .query(&[("from", from.as_str()), ("via", via.as_str())])
            .send()
            .await?;
        Self::read_json(response).await
    }
}
