//! Real-time message relay library.
//!
//! Authenticated clients join conversations over WebSocket, exchange
//! persisted messages and ephemeral typing signals, and fetch history over
//! HTTP.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
