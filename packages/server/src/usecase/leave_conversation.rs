//! UseCase: 会話からの退出

use std::sync::Arc;

use crate::{
    domain::ConversationId,
    infrastructure::{Connection, Departure, RoomRouter},
};

/// 会話退出のユースケース
pub struct LeaveConversationUseCase {
    router: Arc<RoomRouter>,
}

impl LeaveConversationUseCase {
    pub fn new(router: Arc<RoomRouter>) -> Self {
        Self { router }
    }

    /// 退出を実行（冪等）
    ///
    /// 入力中だった場合は残りのメンバーに `stop_typing` が送られる。
    pub async fn execute(
        &self,
        connection: &Connection,
        conversation_id: &ConversationId,
    ) -> Departure {
        let departure = self.router.leave(conversation_id, &connection.id()).await;
        if !departure.was_member {
            tracing::debug!(
                connection_id = %connection.id(),
                conversation_id = %conversation_id,
                "Leave for a conversation that was not joined"
            );
        }
        departure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Identity, UserId},
        infrastructure::ConnectionRegistry,
    };
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        // テスト項目: 退出後にもう一度退出してもエラーにならず何も起きない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(RoomRouter::new(Arc::clone(&registry)));
        let usecase = LeaveConversationUseCase::new(Arc::clone(&router));
        let (tx, _rx) = mpsc::channel(8);
        let connection = Connection::new(tx);
        connection
            .bind_identity(Identity::new(UserId::new("alice".to_string()).unwrap(), None))
            .unwrap();
        let connection = registry.register(connection).await;
        let c1 = ConversationId::new("c1".to_string()).unwrap();
        router.join(&c1, connection.id()).await.unwrap();

        // when (操作):
        let first = usecase.execute(&connection, &c1).await;
        let second = usecase.execute(&connection, &c1).await;

        // then (期待する結果):
        assert!(first.was_member);
        assert!(!second.was_member);
        assert_eq!(router.member_count(&c1).await, 0);
    }
}
