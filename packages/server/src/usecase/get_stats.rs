//! UseCase: 稼働状況の取得

use std::sync::Arc;

use crate::infrastructure::{ConnectionRegistry, RoomRouter};

/// 稼働中のコネクション数と会話数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub active_connections: usize,
    pub active_conversations: usize,
}

/// 稼働状況取得のユースケース
pub struct GetStatsUseCase {
    registry: Arc<ConnectionRegistry>,
    router: Arc<RoomRouter>,
}

impl GetStatsUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, router: Arc<RoomRouter>) -> Self {
        Self { registry, router }
    }

    pub async fn execute(&self) -> RelayStats {
        RelayStats {
            active_connections: self.registry.count().await,
            active_conversations: self.router.active_conversations().await,
        }
    }
}
