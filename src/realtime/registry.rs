//! One live connection per identity
//!
//! Registering replaces whatever was there; the replaced connection is not
//! closed here, the transport owns its lifetime. Handles are cloned out of
//! the map before sending, so no lock is held across a send.

use crate::core::error::Result;
use crate::realtime::protocol::ServerMessage;
use async_trait::async_trait;
use ahash::AHashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A live client connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Unique per physical connection, stable for its lifetime
    fn id(&self) -> &str;

    async fn send(&self, message: &ServerMessage) -> Result<()>;
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<AHashMap<String, Arc<dyn Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection` for `identity`, returning the handle it replaced
    pub async fn register(
        &self,
        identity: &str,
        connection: Arc<dyn Connection>,
    ) -> Option<Arc<dyn Connection>> {
        let mut connections = self.connections.write().await;
        let replaced = connections.insert(identity.to_string(), connection);
        tracing::info!(
            identity,
            replaced = replaced.is_some(),
            live = connections.len(),
            "Connection registered"
        );
        replaced
    }

    pub async fn unregister(&self, identity: &str) -> bool {
        let removed = self.connections.write().await.remove(identity).is_some();
        if removed {
            tracing::info!(identity, "Connection unregistered");
        }
        removed
    }

    /// Unregister only if `connection_id` is still the registered connection.
    ///
    /// A closing socket must not evict the connection that replaced it.
    pub async fn unregister_if_current(&self, identity: &str, connection_id: &str) -> bool {
        let mut connections = self.connections.write().await;
        let is_current = connections
            .get(identity)
            .is_some_and(|conn| conn.id() == connection_id);
        if is_current {
            connections.remove(identity);
            tracing::info!(identity, connection_id, "Connection unregistered");
        }
        is_current
    }

    pub async fn is_connected(&self, identity: &str) -> bool {
        self.connections.read().await.contains_key(identity)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Push to one identity.
    ///
    /// `false` when nobody is registered or the transport fails; a failing
    /// connection is unregistered.
    pub async fn send(&self, identity: &str, message: &ServerMessage) -> bool {
        let connection = self.connections.read().await.get(identity).cloned();
        let Some(connection) = connection else {
            tracing::debug!(identity, "No live connection");
            return false;
        };

        match connection.send(message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(identity, error = %e, "Send failed, dropping connection");
                self.unregister_if_current(identity, connection.id()).await;
                false
            }
        }
    }

    /// Push to every live connection; returns how many succeeded
    pub async fn broadcast(&self, message: &ServerMessage) -> usize {
        let snapshot: Vec<(String, Arc<dyn Connection>)> = self
            .connections
            .read()
            .await
            .iter()
            .map(|(identity, conn)| (identity.clone(), conn.clone()))
            .collect();

        let mut delivered = 0;
        for (identity, connection) in snapshot {
            match connection.send(message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(identity = %identity, error = %e, "Broadcast failed, dropping connection");
                    self.unregister_if_current(&identity, connection.id()).await;
                }
            }
        }
        delivered
    }
}
