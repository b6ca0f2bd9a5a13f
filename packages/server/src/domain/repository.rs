//! Collaborator traits.
//!
//! The relay consumes two external collaborators: a durable Message Store and
//! an Identity Verifier. Concrete implementations live in the infrastructure
//! layer; use cases depend only on these traits.

use async_trait::async_trait;

use super::{
    entity::{Identity, NewMessage, StoredMessage},
    error::{StoreError, VerifyError},
    value_object::{ConversationId, Credential, SequenceId},
};

/// Durable, append-only message record keyed by conversation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its sequence id and creation time
    async fn append(&self, message: NewMessage) -> Result<StoredMessage, StoreError>;

    /// Messages of a conversation with `sequence_id > cursor`, in append order
    async fn list_since(
        &self,
        conversation_id: &ConversationId,
        cursor: Option<SequenceId>,
    ) -> Result<Vec<StoredMessage>, StoreError>;
}

/// Opaque credential → user identity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &Credential) -> Result<Identity, VerifyError>;
}

/// Result of the persistence step of a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted(StoredMessage),
    StoreFailed(String),
}

impl PersistOutcome {
    /// Append through the store, folding the error into the outcome
    pub async fn append(store: &dyn MessageStore, message: NewMessage) -> Self {
        match store.append(message).await {
            Ok(stored) => Self::Persisted(stored),
            Err(StoreError::Unavailable(reason)) => Self::StoreFailed(reason),
        }
    }
}
