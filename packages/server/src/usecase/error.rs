//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ConversationId, RelayEvent};

/// Relay Session が扱うエラー
///
/// 各バリアントはクライアントに返す安定したエラーコードを持つ。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// 資格情報が無い・不正（接続は閉じられる）
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    /// 匿名セッションで送信系の操作を行った
    #[error("this action requires an authenticated session")]
    Unauthenticated,

    /// 参加していない会話への送信・入力通知
    #[error("conversation '{0}' has not been joined")]
    NotJoined(ConversationId),

    #[error("message text must not be empty")]
    EmptyPayload,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// 永続化に失敗したため配信していない
    #[error("message store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("session is closed")]
    SessionClosed,
}

impl RelayError {
    /// ワイヤ上のエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailure(_) => "authentication_failure",
            Self::Unauthenticated => "unauthenticated",
            Self::NotJoined(_) => "not_joined",
            Self::EmptyPayload => "empty_payload",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::SessionClosed => "session_closed",
        }
    }

    /// クライアントに返す error イベントに変換
    pub fn to_event(&self) -> RelayEvent {
        RelayEvent::Error {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_carries_code_and_message() {
        // テスト項目: エラーが安定したコードとメッセージを持つ error イベントになる
        // given (前提条件):
        let error = RelayError::NotJoined(ConversationId::new("c1".to_string()).unwrap());

        // when (操作):
        let event = error.to_event();

        // then (期待する結果):
        assert_eq!(
            event,
            RelayEvent::Error {
                code: "not_joined",
                message: "conversation 'c1' has not been joined".to_string(),
            }
        );
    }
}
