//! UseCase: 入力中通知（typing / stop_typing）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - TypingUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 状態が変化した時だけ送信者以外にブロードキャストされることを保証
//! - typing → stop_typing で状態が残らないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：typing と stop_typing の往復
//! - 異常系：未参加の会話
//! - エッジケース：typing の連続送信

use std::sync::Arc;

use crate::{
    domain::{ConversationId, RelayEvent},
    infrastructure::{Connection, RoomRouter},
};

use super::error::RelayError;

/// 入力中通知のユースケース
pub struct TypingUseCase {
    router: Arc<RoomRouter>,
}

impl TypingUseCase {
    pub fn new(router: Arc<RoomRouter>) -> Self {
        Self { router }
    }

    /// 入力中状態を更新する
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 状態が変化し、他のメンバーに通知した
    /// * `Ok(false)` - 既に同じ状態だった（通知なし）
    pub async fn execute(
        &self,
        connection: &Connection,
        conversation_id: &ConversationId,
        typing: bool,
    ) -> Result<bool, RelayError> {
        let user_id = connection
            .identity()
            .map(|identity| identity.user_id.clone())
            .ok_or(RelayError::Unauthenticated)?;

        let Some(mut room) = self.router.lock(conversation_id).await else {
            return Err(RelayError::NotJoined(conversation_id.clone()));
        };
        if !room.contains(&connection.id()) {
            room.finish().await;
            return Err(RelayError::NotJoined(conversation_id.clone()));
        }

        let changed = room.set_typing(&user_id, typing);
        if changed {
            let event = if typing {
                RelayEvent::Typing {
                    conversation_id: conversation_id.clone(),
                    sender_id: user_id,
                }
            } else {
                RelayEvent::StopTyping {
                    conversation_id: conversation_id.clone(),
                    sender_id: user_id,
                }
            };
            room.broadcast(&connection.id(), &event);
        }
        room.finish().await;

        Ok(changed)
    }
}
