//! WebSocket event DTOs.
//!
//! Every frame is a JSON object discriminated by `type` (snake_case) with
//! camelCase fields.

use serde::{Deserialize, Serialize};

use crate::domain::RelayEvent;

/// Events sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Present the credential as the first frame
    Authenticate { token: String },

    Join { conversation_id: String },

    Leave { conversation_id: String },

    SendMessage {
        conversation_id: String,
        text: String,
        /// Opaque client-side reference echoed back in the acknowledgement
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_ref: Option<String>,
    },

    Typing { conversation_id: String },

    StopTyping { conversation_id: String },
}

/// Persisted message record as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub conversation_id: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    pub text: String,
    /// RFC 3339
    pub created_at: String,
    pub sequence_id: u64,
}

/// Events sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    ReceiveMessage(MessageRecord),

    Typing {
        conversation_id: String,
        sender_id: String,
    },

    StopTyping {
        conversation_id: String,
        sender_id: String,
    },

    Joined { conversation_id: String },

    MessageSent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_ref: Option<String>,
        message: MessageRecord,
    },

    SendFailed {
        conversation_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_ref: Option<String>,
        reason: String,
    },

    Error { code: String, message: String },
}

/// Serialize a relay event into a text frame payload
pub fn encode_event(event: &RelayEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ServerEvent::from(event))
}
