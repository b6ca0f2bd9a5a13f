//! Relay configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    /// `0` binds an ephemeral port
    pub port: u16,
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
    /// Window for presenting a credential after the socket is accepted
    pub handshake_timeout: Duration,
    /// Per-connection outbound buffer; a full buffer drops the recipient
    pub outbound_queue_capacity: usize,
    /// Upper bound on a single socket write
    pub write_timeout: Duration,
    /// Accept connections without a credential as receive-only sessions
    pub allow_anonymous: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            jwt_secret: String::new(),
            handshake_timeout: Duration::from_secs(5),
            outbound_queue_capacity: 256,
            write_timeout: Duration::from_secs(10),
            allow_anonymous: false,
        }
    }
}

impl RelayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clamp values the runtime cannot work with.
    ///
    /// A zero outbound capacity is raised to one, the smallest queue a
    /// bounded channel accepts.
    pub fn normalized(mut self) -> Self {
        if self.outbound_queue_capacity == 0 {
            tracing::warn!("outbound_queue_capacity must be at least 1, using 1");
            self.outbound_queue_capacity = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_raises_zero_outbound_capacity() {
        // テスト項目: 送信キュー容量 0 は 1 に補正される
        // given (前提条件):
        let config = RelayConfig {
            outbound_queue_capacity: 0,
            ..RelayConfig::default()
        };

        // when (操作):
        let config = config.normalized();

        // then (期待する結果):
        assert_eq!(config.outbound_queue_capacity, 1);
    }

    #[test]
    fn test_normalized_keeps_valid_values() {
        // テスト項目: 有効な設定値はそのまま保持される
        // given (前提条件):
        let config = RelayConfig::default();

        // when (操作):
        let normalized = config.clone().normalized();

        // then (期待する結果):
        assert_eq!(normalized.outbound_queue_capacity, 256);
        assert_eq!(normalized.handshake_timeout, config.handshake_timeout);
        assert_eq!(normalized.bind_addr(), "127.0.0.1:8080");
    }
}
