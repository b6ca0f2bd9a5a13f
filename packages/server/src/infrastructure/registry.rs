//! Connection Registry.
//!
//! Owns every live `Connection`. Registration happens once per physical
//! connection at accept time; `unregister` is idempotent because several
//! teardown triggers may race.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::domain::ConnectionId;

use super::connection::Connection;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: Connection) -> Arc<Connection> {
        let connection = Arc::new(connection);
        let mut connections = self.connections.write().await;
        connections.insert(connection.id(), Arc::clone(&connection));

        tracing::debug!(
            connection_id = %connection.id(),
            total_connections = connections.len(),
            "Connection registered"
        );

        connection
    }

    /// Remove a connection. Safe to call any number of times.
    pub async fn unregister(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(connection_id);
        if removed.is_some() {
            tracing::debug!(
                connection_id = %connection_id,
                remaining_connections = connections.len(),
                "Connection unregistered"
            );
        }
        removed
    }

    pub async fn lookup(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.read().await.get(connection_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn create_connection() -> (Connection, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (Connection::new(tx), rx)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        // テスト項目: 登録したコネクションを ID で参照できる
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let id = connection.id();

        // when (操作):
        registry.register(connection).await;

        // then (期待する結果):
        assert_eq!(registry.count().await, 1);
        let found = registry.lookup(&id).await;
        assert_eq!(found.map(|c| c.id()), Some(id));
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: unregister を複数回呼んでも安全（冪等性）
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let id = connection.id();
        registry.register(connection).await;

        // when (操作):
        let first = registry.unregister(&id).await;
        let second = registry.unregister(&id).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(registry.count().await, 0);
        assert!(registry.lookup(&id).await.is_none());
    }
}
