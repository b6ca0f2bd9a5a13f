//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};

use crate::{
    domain::{ConversationId, SequenceId},
    infrastructure::dto::{
        http::{HistoryQuery, StatsDto},
        websocket::MessageRecord,
    },
    ui::state::AppState,
    usecase::RelayError,
};

use super::bearer_credential;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Persisted messages of a conversation in append order
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Query(query): Query<HistoryQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageRecord>>, StatusCode> {
    let conversation_id = ConversationId::new(conversation_id).map_err(|e| {
        tracing::warn!(error = %e, "Invalid conversation id in history request");
        StatusCode::BAD_REQUEST
    })?;

    let messages = state
        .services
        .get_history
        .execute(
            bearer_credential(&headers),
            &conversation_id,
            query.since.map(SequenceId::new),
        )
        .await
        .map_err(|e| match e {
            RelayError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            RelayError::StoreUnavailable(reason) => {
                tracing::error!(reason = %reason, "History lookup failed");
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        })?;

    // Domain Model から DTO への変換
    Ok(Json(messages.iter().map(MessageRecord::from).collect()))
}

/// Active connections and conversations
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    let stats = state.services.get_stats.execute().await;
    Json(StatsDto {
        active_connections: stats.active_connections,
        active_conversations: stats.active_conversations,
    })
}
