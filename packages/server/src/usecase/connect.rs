//! UseCase: 接続受付とハンドシェイク
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUseCase::accept() / authenticate() メソッド
//!
//! ### なぜこのテストが必要か
//! - Identity Verifier は接続ごとに一度だけ呼ばれなければならない
//! - 認証失敗時にイベントが処理される前に拒否されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効な資格情報での認証
//! - 異常系：不正な資格情報・資格情報なし
//! - エッジケース：匿名セッションを許可したデプロイ

use std::sync::Arc;

use crate::{
    domain::{Credential, IdentityVerifier, SessionState, VerifyError},
    infrastructure::{Connection, ConnectionRegistry, OutboundSender},
};

use super::error::RelayError;

/// 接続受付とハンドシェイクのユースケース
pub struct ConnectUseCase {
    registry: Arc<ConnectionRegistry>,
    verifier: Arc<dyn IdentityVerifier>,
    /// 資格情報なしの接続を Anonymous として受け入れるか
    allow_anonymous: bool,
}

impl ConnectUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        verifier: Arc<dyn IdentityVerifier>,
        allow_anonymous: bool,
    ) -> Self {
        Self {
            registry,
            verifier,
            allow_anonymous,
        }
    }

    /// ソケット受付時にコネクションを登録する
    pub async fn accept(&self, outbound: OutboundSender) -> Arc<Connection> {
        self.registry.register(Connection::new(outbound)).await
    }

    /// ハンドシェイクを実行
    ///
    /// # Returns
    ///
    /// * `Ok(SessionState)` - `Authenticated` または `Anonymous`
    /// * `Err(RelayError::AuthenticationFailure)` - 接続を閉じるべき
    pub async fn authenticate(
        &self,
        connection: &Connection,
        credential: Option<Credential>,
    ) -> Result<SessionState, RelayError> {
        let Some(credential) = credential else {
            if self.allow_anonymous {
                tracing::info!(connection_id = %connection.id(), "Anonymous session accepted");
                return Ok(SessionState::Anonymous);
            }
            return Err(RelayError::AuthenticationFailure(
                VerifyError::MissingCredential.to_string(),
            ));
        };

        let identity = self
            .verifier
            .verify(&credential)
            .await
            .map_err(|e| RelayError::AuthenticationFailure(e.to_string()))?;

        connection
            .bind_identity(identity.clone())
            .map_err(|_| RelayError::AuthenticationFailure("already authenticated".to_string()))?;

        tracing::info!(
            connection_id = %connection.id(),
            user_id = %identity.user_id,
            "Session authenticated"
        );
        Ok(SessionState::Authenticated(identity))
    }
}
