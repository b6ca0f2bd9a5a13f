//! Domain layer for the Parley relay.
//!
//! This module contains the relay's vocabulary and business rules that are
//! independent of the transport, the wire format and storage backends.

pub mod entity;
pub mod error;
pub mod event;
pub mod repository;
pub mod session;
pub mod typing;
pub mod value_object;

pub use entity::{Identity, NewMessage, StoredMessage};
pub use error::{DeliveryError, StoreError, ValueObjectError, VerifyError};
pub use event::RelayEvent;
pub use repository::{IdentityVerifier, MessageStore, PersistOutcome};
#[cfg(test)]
pub use repository::{MockIdentityVerifier, MockMessageStore};
pub use session::{SessionEvent, SessionState};
pub use typing::{TypingKey, TypingTracker};
pub use value_object::{
    ConnectionId, ConversationId, Credential, MessageText, SequenceId, Timestamp, UserId,
};
