//! Live client connection.
//!
//! ## Responsibilities
//!
//! - Hold the bounded outbound queue drained by the socket writer task
//! - Remember the identity bound at handshake and the joined conversations
//! - Signal the socket loop when the relay drops a stuck recipient
//!
//! A `Connection` is owned by the `ConnectionRegistry`. Rooms only keep
//! `Weak` references to it.

use std::{
    collections::HashSet,
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::{Mutex, Notify, mpsc, mpsc::error::TrySendError};

use crate::domain::{ConnectionId, ConversationId, DeliveryError, Identity};

/// Outbound channel of serialized server events
pub type OutboundSender = mpsc::Sender<String>;

#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbound: OutboundSender,
    identity: OnceLock<Identity>,
    joined: Mutex<HashSet<ConversationId>>,
    closed: AtomicBool,
    kicked: Notify,
}

impl Connection {
    pub fn new(outbound: OutboundSender) -> Self {
        Self {
            id: ConnectionId::generate(),
            outbound,
            identity: OnceLock::new(),
            joined: Mutex::new(HashSet::new()),
            closed: AtomicBool::new(false),
            kicked: Notify::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Bind the authenticated identity. Only the first call succeeds.
    pub fn bind_identity(&self, identity: Identity) -> Result<(), Identity> {
        self.identity.set(identity)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Queue a payload without waiting.
    ///
    /// A full queue means the client is not keeping up; the caller treats it
    /// as a delivery failure instead of stalling.
    pub fn push(&self, payload: String) -> Result<(), DeliveryError> {
        self.outbound.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub async fn track_join(&self, conversation_id: ConversationId) -> bool {
        self.joined.lock().await.insert(conversation_id)
    }

    pub async fn track_leave(&self, conversation_id: &ConversationId) -> bool {
        self.joined.lock().await.remove(conversation_id)
    }

    pub async fn has_joined(&self, conversation_id: &ConversationId) -> bool {
        self.joined.lock().await.contains(conversation_id)
    }

    /// Snapshot of joined conversations, sorted for deterministic teardown
    pub async fn joined_conversations(&self) -> Vec<ConversationId> {
        let mut joined: Vec<ConversationId> = self.joined.lock().await.iter().cloned().collect();
        joined.sort();
        joined
    }

    /// Mark the connection closed. Returns `true` for the first caller only.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Ask the socket loop to terminate this connection
    pub fn kick(&self) {
        self.kicked.notify_one();
    }

    /// Resolves once `kick` has been called (a permit is kept if it came first)
    pub async fn kicked(&self) {
        self.kicked.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[tokio::test]
    async fn test_push_delivers_to_outbound_queue() {
        // テスト項目: push したペイロードが送信キューに入る
        // given (前提条件):
        let (tx, mut rx) = mpsc::channel(4);
        let connection = Connection::new(tx);

        // when (操作):
        let result = connection.push("hello".to_string());

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_full_queue_fails_without_waiting() {
        // テスト項目: キューが満杯の場合は待たずに QueueFull を返す
        // given (前提条件):
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);
        connection.push("first".to_string()).unwrap();

        // when (操作):
        let result = connection.push("second".to_string());

        // then (期待する結果):
        assert_eq!(result, Err(DeliveryError::QueueFull));
    }

    #[tokio::test]
    async fn test_push_to_dropped_receiver_fails() {
        // テスト項目: 受信側が閉じている場合は Closed を返す
        // given (前提条件):
        let (tx, rx) = mpsc::channel(1);
        let connection = Connection::new(tx);
        drop(rx);

        // when (操作):
        let result = connection.push("hello".to_string());

        // then (期待する結果):
        assert_eq!(result, Err(DeliveryError::Closed));
    }

    #[tokio::test]
    async fn test_identity_binds_once() {
        // テスト項目: identity は一度だけバインドできる
        // given (前提条件):
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);
        let alice = Identity::new(UserId::new("alice".to_string()).unwrap(), None);
        let bob = Identity::new(UserId::new("bob".to_string()).unwrap(), None);

        // when (操作):
        let first = connection.bind_identity(alice.clone());
        let second = connection.bind_identity(bob);

        // then (期待する結果):
        assert!(first.is_ok());
        assert!(second.is_err());
        assert_eq!(connection.identity(), Some(&alice));
    }

    #[tokio::test]
    async fn test_mark_closed_only_first_caller_wins() {
        // テスト項目: mark_closed は最初の呼び出しのみ true を返す
        // given (前提条件):
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);

        // when (操作):
        let first = connection.mark_closed();
        let second = connection.mark_closed();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn test_kick_before_wait_is_not_lost() {
        // テスト項目: 待機前に kick されても通知が失われない
        // given (前提条件):
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);

        // when (操作):
        connection.kick();

        // then (期待する結果):
        tokio::time::timeout(std::time::Duration::from_millis(100), connection.kicked())
            .await
            .expect("kick permit should be stored");
    }
}
