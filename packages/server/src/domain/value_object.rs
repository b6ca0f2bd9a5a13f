//! Value objects for the relay domain.
//!
//! Each value object validates itself on construction, so the rest of the
//! relay can rely on, for example, a `ConversationId` never being blank.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a conversation identifier (characters)
pub const MAX_CONVERSATION_ID_LEN: usize = 128;

/// Maximum length of a message body (characters)
pub const MAX_MESSAGE_TEXT_LEN: usize = 4000;

/// Opaque identifier of one physical connection, unique for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authenticated user identity as issued by the Identity Verifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("user id"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a conversation (group room or private chat)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("conversation id"));
        }
        let len = value.chars().count();
        if len > MAX_CONVERSATION_ID_LEN {
            return Err(ValueObjectError::TooLong {
                field: "conversation id",
                max: MAX_CONVERSATION_ID_LEN,
                actual: len,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message body. Never blank; kept exactly as the sender typed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("message text"));
        }
        let len = value.chars().count();
        if len > MAX_MESSAGE_TEXT_LEN {
            return Err(ValueObjectError::TooLong {
                field: "message text",
                max: MAX_MESSAGE_TEXT_LEN,
                actual: len,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Store-assigned durable ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceId(u64);

impl SequenceId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unix timestamp in milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Opaque credential presented during the handshake.
///
/// The token itself never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("credential"));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_is_unique() {
        // テスト項目: 生成される ConnectionId は毎回異なる
        // given (前提条件):
        let first = ConnectionId::generate();

        // when (操作):
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }

    #[test]
    fn test_conversation_id_rejects_blank() {
        // テスト項目: 空白のみの ConversationId はエラーになる
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = ConversationId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("conversation id")));
    }

    #[test]
    fn test_conversation_id_rejects_too_long() {
        // テスト項目: 上限を超える長さの ConversationId はエラーになる
        // given (前提条件):
        let value = "c".repeat(MAX_CONVERSATION_ID_LEN + 1);

        // when (操作):
        let result = ConversationId::try_from(value);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::TooLong { .. })));
    }

    #[test]
    fn test_message_text_rejects_whitespace_only() {
        // テスト項目: 空白・改行のみのメッセージはエラーになる
        // given (前提条件):
        let value = " \n\t ".to_string();

        // when (操作):
        let result = MessageText::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("message text")));
    }

    #[test]
    fn test_message_text_keeps_original_spacing() {
        // テスト項目: 有効なメッセージは前後の空白を含めてそのまま保持される
        // given (前提条件):
        let value = "  hello  ".to_string();

        // when (操作):
        let text = MessageText::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(text.as_str(), "  hello  ");
    }

    #[test]
    fn test_message_text_length_counts_characters() {
        // テスト項目: 文字数上限はバイト数ではなく文字数で判定される
        // given (前提条件):
        let value = "あ".repeat(MAX_MESSAGE_TEXT_LEN);

        // when (操作):
        let result = MessageText::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        // テスト項目: Credential の Debug 出力にトークンが含まれない
        // given (前提条件):
        let credential = Credential::new("secret-token".to_string()).unwrap();

        // when (操作):
        let debug = format!("{:?}", credential);

        // then (期待する結果):
        assert!(!debug.contains("secret-token"));
    }
}
