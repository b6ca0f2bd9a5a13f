//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Query parameters of the history endpoint
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only records with a greater sequence id are returned
    pub since: Option<u64>,
}

/// Relay statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub active_connections: usize,
    pub active_conversations: usize,
}
