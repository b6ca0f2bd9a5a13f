//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 永続化してから配信する順序（永続化に失敗したメッセージは配信しない）
//!
//! ### なぜこのテストが必要か
//! - 送信者には配信されない（自分へのエコーなし）
//! - 会話内の配信順が Message Store の追記順と一致することを保証
//! - Message Store の障害時に他のメンバーへ何も届かないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト
//! - 異常系：未参加の会話、空のメッセージ、Message Store 障害
//! - エッジケース：匿名セッションからの送信

use std::sync::Arc;

use crate::{
    domain::{
        ConversationId, MessageStore, MessageText, NewMessage, PersistOutcome, RelayEvent,
        StoredMessage, ValueObjectError,
    },
    infrastructure::{Connection, RoomRouter},
};

use super::error::RelayError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    router: Arc<RoomRouter>,
    store: Arc<dyn MessageStore>,
}

impl SendMessageUseCase {
    pub fn new(router: Arc<RoomRouter>, store: Arc<dyn MessageStore>) -> Self {
        Self { router, store }
    }

    /// メッセージ送信を実行
    ///
    /// 会話のロックを保持したまま 永続化 → 配信 を行うため、
    /// 同じ会話の配信順は追記順と一致する。
    ///
    /// # Returns
    ///
    /// * `Ok(StoredMessage)` - 永続化されたメッセージ（送信者への確認応答に使う）
    /// * `Err(RelayError::StoreUnavailable)` - 永続化に失敗（配信していない）
    pub async fn execute(
        &self,
        connection: &Connection,
        conversation_id: &ConversationId,
        text: String,
    ) -> Result<StoredMessage, RelayError> {
        // 1. 送信者の identity と本文を検証
        let sender = connection
            .identity()
            .cloned()
            .ok_or(RelayError::Unauthenticated)?;
        let text = MessageText::new(text).map_err(|e| match e {
            ValueObjectError::Empty(_) => RelayError::EmptyPayload,
            other => RelayError::InvalidPayload(other.to_string()),
        })?;

        // 2. 会話をロックして参加を確認
        let Some(mut room) = self.router.lock(conversation_id).await else {
            return Err(RelayError::NotJoined(conversation_id.clone()));
        };
        if !room.contains(&connection.id()) {
            room.finish().await;
            return Err(RelayError::NotJoined(conversation_id.clone()));
        }

        // 3. 永続化
        let message = NewMessage {
            conversation_id: conversation_id.clone(),
            sender,
            text,
        };
        let stored = match PersistOutcome::append(self.store.as_ref(), message).await {
            PersistOutcome::Persisted(stored) => stored,
            PersistOutcome::StoreFailed(reason) => {
                room.finish().await;
                tracing::error!(
                    connection_id = %connection.id(),
                    conversation_id = %conversation_id,
                    reason = %reason,
                    "Failed to persist message, nothing was broadcast"
                );
                return Err(RelayError::StoreUnavailable(reason));
            }
        };

        // 4. 送信者以外へブロードキャスト
        let report = room.broadcast(
            &connection.id(),
            &RelayEvent::MessageReceived(stored.clone()),
        );
        room.finish().await;

        tracing::info!(
            connection_id = %connection.id(),
            conversation_id = %conversation_id,
            sequence_id = %stored.sequence_id,
            recipients = report.delivered,
            "Message relayed"
        );
        Ok(stored)
    }
}
