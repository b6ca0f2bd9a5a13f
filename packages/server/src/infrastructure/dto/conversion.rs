//! Conversion logic between DTOs and domain types.

use parley_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ConversationId, Credential, RelayEvent, SessionEvent, StoredMessage, ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

/// A decoded client frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Authenticate(Credential),
    Event(SessionEvent),
}

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::ClientEvent> for ClientFrame {
    type Error = ValueObjectError;

    fn try_from(event: dto::ClientEvent) -> Result<Self, Self::Error> {
        let frame = match event {
            dto::ClientEvent::Authenticate { token } => Self::Authenticate(Credential::new(token)?),
            dto::ClientEvent::Join { conversation_id } => {
                Self::Event(SessionEvent::Join(ConversationId::new(conversation_id)?))
            }
            dto::ClientEvent::Leave { conversation_id } => {
                Self::Event(SessionEvent::Leave(ConversationId::new(conversation_id)?))
            }
            dto::ClientEvent::SendMessage {
                conversation_id,
                text,
                client_ref,
            } => Self::Event(SessionEvent::Send {
                conversation_id: ConversationId::new(conversation_id)?,
                text,
                client_ref,
            }),
            dto::ClientEvent::Typing { conversation_id } => {
                Self::Event(SessionEvent::Typing(ConversationId::new(conversation_id)?))
            }
            dto::ClientEvent::StopTyping { conversation_id } => {
                Self::Event(SessionEvent::StopTyping(ConversationId::new(conversation_id)?))
            }
        };
        Ok(frame)
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&StoredMessage> for dto::MessageRecord {
    fn from(message: &StoredMessage) -> Self {
        Self {
            conversation_id: message.conversation_id.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            sender_email: message.sender_email.clone(),
            text: message.text.as_str().to_string(),
            created_at: timestamp_to_rfc3339(message.created_at.value()),
            sequence_id: message.sequence_id.value(),
        }
    }
}

impl From<&RelayEvent> for dto::ServerEvent {
    fn from(event: &RelayEvent) -> Self {
        match event {
            RelayEvent::MessageReceived(message) => Self::ReceiveMessage(message.into()),
            RelayEvent::Typing {
                conversation_id,
                sender_id,
            } => Self::Typing {
                conversation_id: conversation_id.as_str().to_string(),
                sender_id: sender_id.as_str().to_string(),
            },
            RelayEvent::StopTyping {
                conversation_id,
                sender_id,
            } => Self::StopTyping {
                conversation_id: conversation_id.as_str().to_string(),
                sender_id: sender_id.as_str().to_string(),
            },
            RelayEvent::Joined { conversation_id } => Self::Joined {
                conversation_id: conversation_id.as_str().to_string(),
            },
            RelayEvent::MessageSent {
                client_ref,
                message,
            } => Self::MessageSent {
                client_ref: client_ref.clone(),
                message: message.into(),
            },
            RelayEvent::SendFailed {
                conversation_id,
                client_ref,
                reason,
            } => Self::SendFailed {
                conversation_id: conversation_id.as_str().to_string(),
                client_ref: client_ref.clone(),
                reason: reason.clone(),
            },
            RelayEvent::Error { code, message } => Self::Error {
                code: (*code).to_string(),
                message: message.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageText, SequenceId, Timestamp, UserId};

    #[test]
    fn test_client_event_to_session_event() {
        // テスト項目: DTO の send_message がドメインの SessionEvent に変換される
        // given (前提条件):
        let event = dto::ClientEvent::SendMessage {
            conversation_id: "c1".to_string(),
            text: "  ".to_string(),
            client_ref: Some("tmp-1".to_string()),
        };

        // when (操作):
        let frame = ClientFrame::try_from(event).unwrap();

        // then (期待する結果): 本文の検証はセッション側で行うため空白のまま通る
        assert_eq!(
            frame,
            ClientFrame::Event(SessionEvent::Send {
                conversation_id: ConversationId::new("c1".to_string()).unwrap(),
                text: "  ".to_string(),
                client_ref: Some("tmp-1".to_string()),
            })
        );
    }

    #[test]
    fn test_blank_conversation_id_is_rejected() {
        // テスト項目: 空の conversationId を含むイベントは変換エラーになる
        // given (前提条件):
        let event = dto::ClientEvent::Join {
            conversation_id: "".to_string(),
        };

        // when (操作):
        let result = ClientFrame::try_from(event);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("conversation id")));
    }

    #[test]
    fn test_authenticate_frame_carries_credential() {
        // テスト項目: authenticate イベントが Credential に変換される
        // given (前提条件):
        let event = dto::ClientEvent::Authenticate {
            token: "abc".to_string(),
        };

        // when (操作):
        let frame = ClientFrame::try_from(event).unwrap();

        // then (期待する結果):
        assert!(matches!(frame, ClientFrame::Authenticate(c) if c.expose() == "abc"));
    }

    #[test]
    fn test_stored_message_to_record() {
        // テスト項目: 保存済みメッセージが永続レコード形式に変換される
        // given (前提条件):
        let message = StoredMessage {
            sequence_id: SequenceId::new(42),
            conversation_id: ConversationId::new("c1".to_string()).unwrap(),
            sender_id: UserId::new("alice".to_string()).unwrap(),
            sender_email: Some("alice@example.com".to_string()),
            text: MessageText::new("hello".to_string()).unwrap(),
            created_at: Timestamp::new(1672531200000),
        };

        // when (操作):
        let record = dto::MessageRecord::from(&message);

        // then (期待する結果):
        assert_eq!(record.conversation_id, "c1");
        assert_eq!(record.sender_id, "alice");
        assert_eq!(record.sender_email.as_deref(), Some("alice@example.com"));
        assert_eq!(record.text, "hello");
        assert_eq!(record.created_at, "2023-01-01T00:00:00.000Z");
        assert_eq!(record.sequence_id, 42);
    }

    #[test]
    fn test_relay_error_event_to_dto() {
        // テスト項目: ドメインの Error イベントが DTO に変換される
        // given (前提条件):
        let event = RelayEvent::Error {
            code: "empty_payload",
            message: "message text must not be empty".to_string(),
        };

        // when (操作):
        let dto_event = dto::ServerEvent::from(&event);

        // then (期待する結果):
        assert_eq!(
            dto_event,
            dto::ServerEvent::Error {
                code: "empty_payload".to_string(),
                message: "message text must not be empty".to_string(),
            }
        );
    }
}
