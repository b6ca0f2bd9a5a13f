//! Shared application state.

use std::sync::Arc;

use crate::{config::RelayConfig, usecase::RelayServices};

/// Shared application state
pub struct AppState {
    /// UseCase 群（Registry と Router を内部で共有）
    pub services: Arc<RelayServices>,
    pub config: RelayConfig,
}
