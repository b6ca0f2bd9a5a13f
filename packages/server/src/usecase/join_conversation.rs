//! UseCase: 会話への参加
//!
//! 参加は冪等で、既に参加済みの会話への join は何もしない。
//! 過去のメッセージは自動では送られない（履歴は HTTP API で取得する）。

use std::sync::Arc;

use crate::{
    domain::{ConversationId, RelayEvent},
    infrastructure::{Connection, RoomRouter, RouterError},
};

use super::error::RelayError;

/// 会話参加のユースケース
pub struct JoinConversationUseCase {
    router: Arc<RoomRouter>,
}

impl JoinConversationUseCase {
    pub fn new(router: Arc<RoomRouter>) -> Self {
        Self { router }
    }

    /// 参加を実行し、要求者に返す `joined` イベントを返す
    pub async fn execute(
        &self,
        connection: &Connection,
        conversation_id: ConversationId,
    ) -> Result<RelayEvent, RelayError> {
        self.router
            .join(&conversation_id, connection.id())
            .await
            .map_err(|e| match e {
                RouterError::UnknownConnection(_) => RelayError::SessionClosed,
            })?;

        Ok(RelayEvent::Joined { conversation_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ConnectionRegistry;
    use tokio::sync::mpsc;

    fn setup() -> (Arc<ConnectionRegistry>, Arc<RoomRouter>, JoinConversationUseCase) {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(RoomRouter::new(Arc::clone(&registry)));
        let usecase = JoinConversationUseCase::new(Arc::clone(&router));
        (registry, router, usecase)
    }

    #[tokio::test]
    async fn test_join_twice_keeps_single_membership() {
        // テスト項目: 同じ会話に二度参加してもメンバー数は 1 のまま
        // given (前提条件):
        let (registry, router, usecase) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let connection = registry.register(Connection::new(tx)).await;
        let c1 = ConversationId::new("c1".to_string()).unwrap();

        // when (操作):
        let first = usecase.execute(&connection, c1.clone()).await;
        let second = usecase.execute(&connection, c1.clone()).await;

        // then (期待する結果):
        assert_eq!(
            first,
            Ok(RelayEvent::Joined {
                conversation_id: c1.clone()
            })
        );
        assert!(second.is_ok());
        assert_eq!(router.member_count(&c1).await, 1);
    }

    #[tokio::test]
    async fn test_join_after_unregister_reports_closed_session() {
        // テスト項目: Registry から削除済みのコネクションは参加できない
        // given (前提条件):
        let (registry, router, usecase) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let connection = registry.register(Connection::new(tx)).await;
        registry.unregister(&connection.id()).await;
        let c1 = ConversationId::new("c1".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&connection, c1.clone()).await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::SessionClosed));
        assert_eq!(router.member_count(&c1).await, 0);
    }
}
