//! Relay Session: コネクションごとの状態機械
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelaySession::authenticate() / handle() / close() メソッド
//! - ソケットなしで型付きイベントを流し、状態遷移と各クライアントへの送信内容を確認
//!
//! ### なぜこのテストが必要か
//! - 認証前のイベントが処理されないことを保証
//! - 切断処理が経路によらず一度だけ実行されることを確認
//! - 送信の確認応答（message_sent / send_failed）が送信者にだけ届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：A と B が c1 に参加し、A が "hello" を送信
//! - 異常系：認証失敗、Message Store 障害、未参加の会話への送信
//! - エッジケース：入力中のまま切断、二重の close、close せずに破棄、匿名セッション

use std::sync::Arc;

use crate::{
    domain::{Credential, RelayEvent, SessionEvent, SessionState},
    infrastructure::{Connection, OutboundSender, dto::websocket::encode_event},
};

use super::{error::RelayError, services::RelayServices};

/// コネクション 1 本分の Relay Session
pub struct RelaySession {
    services: Arc<RelayServices>,
    connection: Arc<Connection>,
    state: SessionState,
}

impl RelaySession {
    /// ソケット受付時に呼ぶ。コネクションを Registry に登録し `Connecting` で開始する。
    pub async fn open(services: Arc<RelayServices>, outbound: OutboundSender) -> Self {
        let connection = services.connect.accept(outbound).await;
        tracing::info!(connection_id = %connection.id(), "Connection accepted");
        Self {
            services,
            connection,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// ハンドシェイクを行う。失敗した場合はセッションを閉じてからエラーを返す。
    pub async fn authenticate(&mut self, credential: Option<Credential>) -> Result<(), RelayError> {
        match &self.state {
            SessionState::Connecting => {}
            SessionState::Closed => return Err(RelayError::SessionClosed),
            _ => {
                return Err(RelayError::InvalidPayload(
                    "session is already authenticated".to_string(),
                ));
            }
        }

        match self
            .services
            .connect
            .authenticate(&self.connection, credential)
            .await
        {
            Ok(state) => {
                self.state = state;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.connection.id(),
                    error = %e,
                    "Handshake failed"
                );
                self.close().await;
                Err(e)
            }
        }
    }

    /// 型付きイベントを 1 件処理する
    ///
    /// 処理の失敗はこのコネクションにだけ error イベントとして返され、
    /// 接続は維持される。
    pub async fn handle(&mut self, event: SessionEvent) {
        if event == SessionEvent::Disconnect {
            self.close().await;
            return;
        }
        if !self.state.is_open() {
            let error = if self.state.is_closed() {
                RelayError::SessionClosed
            } else {
                RelayError::Unauthenticated
            };
            self.reject(&error);
            return;
        }

        let connection = Arc::clone(&self.connection);
        match event {
            SessionEvent::Join(conversation_id) => {
                match self
                    .services
                    .join_conversation
                    .execute(&connection, conversation_id)
                    .await
                {
                    Ok(joined) => self.reply(&joined),
                    Err(e) => self.reject(&e),
                }
            }
            SessionEvent::Leave(conversation_id) => {
                self.services
                    .leave_conversation
                    .execute(&connection, &conversation_id)
                    .await;
            }
            SessionEvent::Send {
                conversation_id,
                text,
                client_ref,
            } => {
                match self
                    .services
                    .send_message
                    .execute(&connection, &conversation_id, text)
                    .await
                {
                    Ok(message) => self.reply(&RelayEvent::MessageSent {
                        client_ref,
                        message,
                    }),
                    Err(RelayError::StoreUnavailable(reason)) => {
                        self.reply(&RelayEvent::SendFailed {
                            conversation_id,
                            client_ref,
                            reason,
                        })
                    }
                    Err(e) => self.reject(&e),
                }
            }
            SessionEvent::Typing(conversation_id) => {
                if let Err(e) = self
                    .services
                    .typing
                    .execute(&connection, &conversation_id, true)
                    .await
                {
                    self.reject(&e);
                }
            }
            SessionEvent::StopTyping(conversation_id) => {
                if let Err(e) = self
                    .services
                    .typing
                    .execute(&connection, &conversation_id, false)
                    .await
                {
                    self.reject(&e);
                }
            }
            SessionEvent::Disconnect => {}
        }
    }

    /// 切断処理。どの経路から何度呼ばれても、実際の処理は一度だけ行われる。
    ///
    /// 実際に切断処理を行った場合は `true` を返す。
    pub async fn close(&mut self) -> bool {
        self.state = SessionState::Closed;
        if !self.connection.mark_closed() {
            return false;
        }
        self.services.disconnect.execute(&self.connection).await;
        true
    }

    /// このコネクションにエラーを返す
    pub fn reject(&self, error: &RelayError) {
        tracing::debug!(
            connection_id = %self.connection.id(),
            code = error.code(),
            error = %error,
            "Rejected client event"
        );
        self.reply(&error.to_event());
    }

    fn reply(&self, event: &RelayEvent) {
        let payload = match encode_event(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize relay event");
                return;
            }
        };
        if let Err(e) = self.connection.push(payload) {
            tracing::warn!(
                connection_id = %self.connection.id(),
                error = %e,
                "Failed to reply to client"
            );
            self.connection.kick();
        }
    }
}

/// `close` を経ずに破棄された場合（タスクの中断や panic）も切断処理を一度だけ行う
impl Drop for RelaySession {
    fn drop(&mut self) {
        if !self.connection.mark_closed() {
            return;
        }
        tracing::warn!(
            connection_id = %self.connection.id(),
            "Session dropped without close, tearing down"
        );
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let services = Arc::clone(&self.services);
        let connection = Arc::clone(&self.connection);
        runtime.spawn(async move {
            services.disconnect.execute(&connection).await;
        });
    }
}
