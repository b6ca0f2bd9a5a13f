//! Request handlers.

mod http;
mod websocket;

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::domain::Credential;

pub use http::{get_history, get_stats, health_check};
pub use websocket::websocket_handler;

/// Credential from an `Authorization: Bearer <token>` header
fn bearer_credential(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    Credential::new(token.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_credential_extraction() {
        // テスト項目: Bearer ヘッダーからトークンが取り出され、それ以外は無視される
        // given (前提条件):
        let mut bearer = HeaderMap::new();
        bearer.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));

        // when (操作) / then (期待する結果):
        assert_eq!(
            bearer_credential(&bearer).map(|c| c.expose().to_string()),
            Some("abc.def".to_string())
        );
        assert!(bearer_credential(&basic).is_none());
        assert!(bearer_credential(&HeaderMap::new()).is_none());
    }
}
