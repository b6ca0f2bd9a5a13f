//! ユースケースの組み立て

use std::sync::Arc;

use crate::{
    domain::{IdentityVerifier, MessageStore},
    infrastructure::{ConnectionRegistry, RoomRouter},
};

use super::{
    connect::ConnectUseCase, disconnect::DisconnectUseCase, get_history::GetHistoryUseCase,
    get_stats::GetStatsUseCase, join_conversation::JoinConversationUseCase,
    leave_conversation::LeaveConversationUseCase, send_message::SendMessageUseCase,
    typing::TypingUseCase,
};

/// リレーの全ユースケース
///
/// Registry と Router はここで生成され、全てのユースケースで共有される。
/// テストごとに新しいインスタンスを作れる。
pub struct RelayServices {
    pub connect: ConnectUseCase,
    pub join_conversation: JoinConversationUseCase,
    pub leave_conversation: LeaveConversationUseCase,
    pub send_message: SendMessageUseCase,
    pub typing: TypingUseCase,
    pub disconnect: DisconnectUseCase,
    pub get_history: GetHistoryUseCase,
    pub get_stats: GetStatsUseCase,
}

impl RelayServices {
    pub fn new(
        store: Arc<dyn MessageStore>,
        verifier: Arc<dyn IdentityVerifier>,
        allow_anonymous: bool,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(RoomRouter::new(Arc::clone(&registry)));

        Self {
            connect: ConnectUseCase::new(
                Arc::clone(&registry),
                Arc::clone(&verifier),
                allow_anonymous,
            ),
            join_conversation: JoinConversationUseCase::new(Arc::clone(&router)),
            leave_conversation: LeaveConversationUseCase::new(Arc::clone(&router)),
            send_message: SendMessageUseCase::new(Arc::clone(&router), Arc::clone(&store)),
            typing: TypingUseCase::new(Arc::clone(&router)),
            disconnect: DisconnectUseCase::new(Arc::clone(&registry), Arc::clone(&router)),
            get_history: GetHistoryUseCase::new(verifier, store),
            get_stats: GetStatsUseCase::new(registry, router),
        }
    }
}
