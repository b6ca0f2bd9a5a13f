//! UseCase: 会話履歴の取得
//!
//! HTTP の履歴 API から呼ばれる。Bearer トークンを検証してから
//! Message Store の `list_since` を呼ぶ。

use std::sync::Arc;

use crate::domain::{
    ConversationId, Credential, IdentityVerifier, MessageStore, SequenceId, StoreError,
    StoredMessage, VerifyError,
};

use super::error::RelayError;

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    verifier: Arc<dyn IdentityVerifier>,
    store: Arc<dyn MessageStore>,
}

impl GetHistoryUseCase {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, store: Arc<dyn MessageStore>) -> Self {
        Self { verifier, store }
    }

    /// `cursor` より後のメッセージを追記順で返す
    pub async fn execute(
        &self,
        credential: Option<Credential>,
        conversation_id: &ConversationId,
        cursor: Option<SequenceId>,
    ) -> Result<Vec<StoredMessage>, RelayError> {
        let credential = credential.ok_or_else(|| {
            RelayError::AuthenticationFailure(VerifyError::MissingCredential.to_string())
        })?;
        let identity = self
            .verifier
            .verify(&credential)
            .await
            .map_err(|e| RelayError::AuthenticationFailure(e.to_string()))?;

        let messages = self
            .store
            .list_since(conversation_id, cursor)
            .await
            .map_err(|StoreError::Unavailable(reason)| RelayError::StoreUnavailable(reason))?;

        tracing::debug!(
            user_id = %identity.user_id,
            conversation_id = %conversation_id,
            count = messages.len(),
            "History fetched"
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Identity, MessageText, MockIdentityVerifier, MockMessageStore, Timestamp, UserId,
    };

    fn c1() -> ConversationId {
        ConversationId::new("c1".to_string()).unwrap()
    }

    fn accepting_verifier() -> MockIdentityVerifier {
        let mut verifier = MockIdentityVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Ok(Identity::new(UserId::new("alice".to_string()).unwrap(), None)));
        verifier
    }

    #[tokio::test]
    async fn test_history_passes_cursor_to_store() {
        // テスト項目: カーソルが Message Store にそのまま渡され、結果が返される
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store
            .expect_list_since()
            .withf(|conversation_id, cursor| {
                conversation_id.as_str() == "c1" && *cursor == Some(SequenceId::new(3))
            })
            .times(1)
            .returning(|conversation_id, _| {
                Ok(vec![StoredMessage {
                    sequence_id: SequenceId::new(4),
                    conversation_id: conversation_id.clone(),
                    sender_id: UserId::new("bob".to_string()).unwrap(),
                    sender_email: None,
                    text: MessageText::new("hi".to_string()).unwrap(),
                    created_at: Timestamp::new(0),
                }])
            });
        let usecase = GetHistoryUseCase::new(Arc::new(accepting_verifier()), Arc::new(store));

        // when (操作):
        let result = usecase
            .execute(
                Some(Credential::new("token".to_string()).unwrap()),
                &c1(),
                Some(SequenceId::new(3)),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].sequence_id, SequenceId::new(4));
    }

    #[tokio::test]
    async fn test_history_requires_credential() {
        // テスト項目: 資格情報なしの履歴取得は拒否され、Message Store は呼ばれない
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store.expect_list_since().times(0);
        let usecase = GetHistoryUseCase::new(Arc::new(accepting_verifier()), Arc::new(store));

        // when (操作):
        let result = usecase.execute(None, &c1(), None).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::AuthenticationFailure(_))));
    }

    #[tokio::test]
    async fn test_history_store_failure() {
        // テスト項目: Message Store の障害は StoreUnavailable として返される
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store
            .expect_list_since()
            .returning(|_, _| Err(StoreError::Unavailable("timeout".to_string())));
        let usecase = GetHistoryUseCase::new(Arc::new(accepting_verifier()), Arc::new(store));

        // when (操作):
        let result = usecase
            .execute(Some(Credential::new("token".to_string()).unwrap()), &c1(), None)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::StoreUnavailable("timeout".to_string()))
        );
    }
}
