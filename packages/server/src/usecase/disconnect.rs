//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断したコネクションが全ての会話・入力中状態から取り除かれることを保証
//! - 残りのメンバーに暗黙の stop_typing が届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数の会話に参加中の切断
//! - エッジケース：入力中のまま切断、二重の切断

use std::sync::Arc;

use crate::infrastructure::{Connection, ConnectionRegistry, RoomRouter};

/// 切断のユースケース
pub struct DisconnectUseCase {
    registry: Arc<ConnectionRegistry>,
    router: Arc<RoomRouter>,
}

impl DisconnectUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, router: Arc<RoomRouter>) -> Self {
        Self { registry, router }
    }

    /// 切断を実行
    ///
    /// 参加中の全ての会話から退出し（入力中なら stop_typing を通知）、
    /// Registry から削除する。何度呼んでも安全。
    ///
    /// # Returns
    ///
    /// 退出した会話の数
    pub async fn execute(&self, connection: &Connection) -> usize {
        let left = self.router.evict(connection).await;
        let removed = self.registry.unregister(&connection.id()).await.is_some();

        if removed {
            tracing::info!(
                connection_id = %connection.id(),
                conversations_left = left,
                "Connection torn down"
            );
        }
        left
    }
}
