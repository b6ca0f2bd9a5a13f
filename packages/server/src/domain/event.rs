//! Outbound events pushed from the relay to clients.

use super::{
    entity::StoredMessage,
    value_object::{ConversationId, UserId},
};

/// Server → client event, independent of its wire encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A persisted message fanned out to the other members
    MessageReceived(StoredMessage),
    Typing {
        conversation_id: ConversationId,
        sender_id: UserId,
    },
    StopTyping {
        conversation_id: ConversationId,
        sender_id: UserId,
    },
    /// Reply to the requester of a successful join
    Joined { conversation_id: ConversationId },
    /// Persisted record returned to the sender (not a room echo)
    MessageSent {
        client_ref: Option<String>,
        message: StoredMessage,
    },
    SendFailed {
        conversation_id: ConversationId,
        client_ref: Option<String>,
        reason: String,
    },
    Error { code: &'static str, message: String },
}
