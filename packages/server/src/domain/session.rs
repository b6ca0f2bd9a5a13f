//! Relay session state machine vocabulary.
//!
//! ```text
//! Connecting ──handshake ok──▶ Authenticated ──▶ Closed
//!     │  └──anonymous allowed──▶ Anonymous ────▶ Closed
//!     └──handshake failed───────────────────────▶ Closed
//! ```
//!
//! Joined conversations are tracked on the connection, so `(Joined)*` is not a
//! separate state here.

use super::{entity::Identity, value_object::ConversationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    /// Deployment allows unauthenticated sessions; may join and receive only
    Anonymous,
    Authenticated(Identity),
    Closed,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether application events may be processed in this state
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Anonymous | Self::Authenticated(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Typed incoming events a session reacts to after the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Join(ConversationId),
    Leave(ConversationId),
    /// Text stays raw here; the relay validates it authoritatively
    Send {
        conversation_id: ConversationId,
        text: String,
        client_ref: Option<String>,
    },
    Typing(ConversationId),
    StopTyping(ConversationId),
    Disconnect,
}
