//! Typing-presence state table.
//!
//! A pure table of `(conversation, user)` pairs that are currently typing.
//! It holds no locks of its own; the Room Router keeps one table per
//! conversation under that conversation's lock, so typing updates never
//! contend across conversations.

use std::collections::HashSet;

use super::value_object::{ConversationId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypingKey {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
}

impl TypingKey {
    pub fn new(conversation_id: ConversationId, user_id: UserId) -> Self {
        Self {
            conversation_id,
            user_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct TypingTracker {
    typing: HashSet<TypingKey>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the typing flag for `key`.
    ///
    /// Returns `true` only when the stored value actually changed, which is
    /// what callers use to suppress redundant broadcasts.
    pub fn set_typing(&mut self, key: TypingKey, typing: bool) -> bool {
        if typing {
            self.typing.insert(key)
        } else {
            self.typing.remove(&key)
        }
    }

    pub fn typing_users(&self, conversation_id: &ConversationId) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .typing
            .iter()
            .filter(|key| &key.conversation_id == conversation_id)
            .map(|key| key.user_id.clone())
            .collect();
        users.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        users
    }
}
