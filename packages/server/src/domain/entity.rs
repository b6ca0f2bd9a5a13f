//! Domain entities.

use serde::{Deserialize, Serialize};

use super::value_object::{ConversationId, MessageText, SequenceId, Timestamp, UserId};

/// Identity bound to a connection once the handshake succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    /// Email claim, when the credential carries one
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        Self { user_id, email }
    }
}

/// A validated message that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender: Identity,
    pub text: MessageText,
}

/// A message as recorded by the Message Store.
///
/// `sequence_id` is the authoritative ordering key; only stored messages are
/// ever fanned out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub sequence_id: SequenceId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub sender_email: Option<String>,
    pub text: MessageText,
    pub created_at: Timestamp,
}

impl StoredMessage {
    /// Record a new message under the given store-assigned sequence and time
    pub fn record(message: NewMessage, sequence_id: SequenceId, created_at: Timestamp) -> Self {
        Self {
            sequence_id,
            conversation_id: message.conversation_id,
            sender_id: message.sender.user_id,
            sender_email: message.sender.email,
            text: message.text,
            created_at,
        }
    }
}
