//! InMemory Message Store 実装
//!
//! ドメイン層が定義する MessageStore trait の具体的な実装。
//! 会話 ID ごとの Vec をインメモリ DB として使用します。
//!
//! シーケンス番号はプロセス全体で単調増加し、追記順がそのまま配信順の基準になります。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parley_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ConversationId, MessageStore, NewMessage, SequenceId, StoreError, StoredMessage, Timestamp,
};

#[derive(Default)]
struct StoreState {
    last_sequence: u64,
    conversations: HashMap<ConversationId, Vec<StoredMessage>>,
}

/// インメモリ Message Store 実装
pub struct InMemoryMessageStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    /// 保存済みメッセージの総数
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.conversations.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: NewMessage) -> Result<StoredMessage, StoreError> {
        let mut state = self.state.lock().await;
        state.last_sequence += 1;
        let stored = StoredMessage::record(
            message,
            SequenceId::new(state.last_sequence),
            Timestamp::new(self.clock.now_millis()),
        );
        state
            .conversations
            .entry(stored.conversation_id.clone())
            .or_default()
            .push(stored.clone());

        tracing::debug!(
            conversation_id = %stored.conversation_id,
            sequence_id = %stored.sequence_id,
            "Message appended"
        );
        Ok(stored)
    }

    async fn list_since(
        &self,
        conversation_id: &ConversationId,
        cursor: Option<SequenceId>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let state = self.state.lock().await;
        let messages = state
            .conversations
            .get(conversation_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| cursor.is_none_or(|cursor| m.sequence_id > cursor))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, MessageText, UserId};
    use parley_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryMessageStore の追記と会話ごとの取得
    // - シーケンス番号の単調増加
    // - カーソル以降のメッセージのみが返されること
    //
    // 【なぜこのテストが必要か】
    // - 追記順が配信順の基準となるため、シーケンス番号の順序保証が中核
    // - 履歴取得 API が list_since に依存している
    // ========================================

    fn create_test_store() -> InMemoryMessageStore {
        InMemoryMessageStore::new(Arc::new(FixedClock::new(1_700_000_000_000)))
    }

    fn new_message(conversation: &str, sender: &str, text: &str) -> NewMessage {
        NewMessage {
            conversation_id: ConversationId::new(conversation.to_string()).unwrap(),
            sender: Identity::new(UserId::new(sender.to_string()).unwrap(), None),
            text: MessageText::new(text.to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequence() {
        // テスト項目: 追記ごとにシーケンス番号が単調増加する（会話をまたいでも）
        // given (前提条件):
        let store = create_test_store();

        // when (操作):
        let first = store.append(new_message("c1", "alice", "one")).await.unwrap();
        let second = store.append(new_message("c2", "bob", "two")).await.unwrap();
        let third = store.append(new_message("c1", "bob", "three")).await.unwrap();

        // then (期待する結果):
        assert!(first.sequence_id < second.sequence_id);
        assert!(second.sequence_id < third.sequence_id);
        assert_eq!(first.created_at, Timestamp::new(1_700_000_000_000));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_list_since_returns_conversation_in_append_order() {
        // テスト項目: 会話のメッセージが追記順で返され、カーソル以前は除外される
        // given (前提条件):
        let store = create_test_store();
        let first = store.append(new_message("c1", "alice", "one")).await.unwrap();
        store.append(new_message("c2", "bob", "other")).await.unwrap();
        store.append(new_message("c1", "bob", "two")).await.unwrap();
        let c1 = ConversationId::new("c1".to_string()).unwrap();

        // when (操作):
        let all = store.list_since(&c1, None).await.unwrap();
        let after_first = store.list_since(&c1, Some(first.sequence_id)).await.unwrap();

        // then (期待する結果):
        let texts: Vec<&str> = all.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(after_first.len(), 1);
        assert_eq!(after_first[0].text.as_str(), "two");
    }

    #[tokio::test]
    async fn test_list_since_unknown_conversation_is_empty() {
        // テスト項目: 存在しない会話の履歴は空で返される
        // given (前提条件):
        let store = create_test_store();

        // when (操作):
        let result = store
            .list_since(&ConversationId::new("nope".to_string()).unwrap(), None)
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(vec![]));
        assert!(store.is_empty().await);
    }
}
