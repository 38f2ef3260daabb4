//! Endpoint store boundary.
//!
//! DESIGN
//! ======
//! The selection/recording engine never touches a concrete collection; it
//! goes through this trait so tests and alternative backends can inject
//! their own. Reads return independent copies — callers never alias the
//! stored value, and a reader can never observe a partially-mutated
//! endpoint while a hit is being recorded.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::Endpoint;

/// Keyed endpoint collection. `save` is a whole-entity replace keyed by id;
/// `list` preserves insertion order for export snapshots.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<Endpoint>;
    async fn save(&self, endpoint: Endpoint) -> Endpoint;
    async fn list(&self) -> Vec<Endpoint>;
    /// Remove one endpoint; false if the id was unknown.
    async fn remove(&self, id: &str) -> bool;
    /// Replace the whole collection (import).
    async fn replace_all(&self, endpoints: Vec<Endpoint>);
}

/// In-memory store over an insertion-ordered vector.
///
/// Pool sizes are small enough that linear scans beat the bookkeeping of an
/// ordered map, and the vector keeps export output in configured order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Vec<Endpoint>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EndpointStore for MemoryStore {
    async fn get(&self, id: &str) -> Option<Endpoint> {
        let endpoints = self.inner.read().await;
        endpoints.iter().find(|ep| ep.id == id).cloned()
    }

    async fn save(&self, endpoint: Endpoint) -> Endpoint {
        let mut endpoints = self.inner.write().await;
        match endpoints.iter_mut().find(|ep| ep.id == endpoint.id) {
            Some(existing) => *existing = endpoint.clone(),
            None => endpoints.push(endpoint.clone()),
        }
        endpoint
    }

    async fn list(&self) -> Vec<Endpoint> {
        self.inner.read().await.clone()
    }

    async fn remove(&self, id: &str) -> bool {
        let mut endpoints = self.inner.write().await;
        let before = endpoints.len();
        endpoints.retain(|ep| ep.id != id);
        endpoints.len() < before
    }

    async fn replace_all(&self, new_endpoints: Vec<Endpoint>) {
        *self.inner.write().await = new_endpoints;
    }
}
