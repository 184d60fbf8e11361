//! HTTP delivery of collection snapshots

use crate::client::Client;
use crate::error::NetworkResult;
use async_trait::async_trait;
use mastermind_sync_engine::{SnapshotTransport, SyncError, SyncResult};
use serde_json::Value;

/// Sends each snapshot as `POST {base}/{collection}` with a JSON array body
#[derive(Debug, Clone)]
pub struct HttpSnapshotTransport {
    client: Client,
    base_url: String,
}

impl HttpSnapshotTransport {
    /// Creates a transport targeting the server at `base_url`
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// URL of one collection
    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    /// Returns the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Closes the client's circuit breaker after a probe found the endpoint up
    ///
    /// Without this a breaker opened during an outage would keep short-circuiting
    /// the first flush after reconnection until its cooldown ends.
    pub fn endpoint_reachable(&self) {
        if let Some(breaker) = self.client.circuit_breaker() {
            breaker.reset();
        }
    }

    /// Downloads the server's current copy of a collection
    pub async fn fetch_collection(&self, collection: &str) -> NetworkResult<Vec<Value>> {
        let response = self.client.get(&self.collection_url(collection)).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SnapshotTransport for HttpSnapshotTransport {
    async fn submit(&self, collection: &str, payload: &Value) -> SyncResult<()> {
        let url = self.collection_url(collection);
        log::debug!("POST {}", url);

        self.client
            .post_json(&url, payload)
            .await
            .map(|_| ())
            .map_err(|e| {
                if e.is_client_error() && !e.is_retryable() {
                    SyncError::rejected(collection, e)
                } else {
                    SyncError::transport(collection, e)
                }
            })
    }
}
