//! UseCase 層
//!
//! Relay Session の状態機械と、それが呼び出す個々のユースケース。
//! ソケットや HTTP には依存しない。

mod connect;
mod disconnect;
mod error;
mod get_history;
mod get_stats;
mod join_conversation;
mod leave_conversation;
mod send_message;
mod services;
mod session;
mod typing;

pub use connect::ConnectUseCase;
pub use disconnect::DisconnectUseCase;
pub use error::RelayError;
pub use get_history::GetHistoryUseCase;
pub use get_stats::{GetStatsUseCase, RelayStats};
pub use join_conversation::JoinConversationUseCase;
pub use leave_conversation::LeaveConversationUseCase;
pub use send_message::SendMessageUseCase;
pub use services::RelayServices;
pub use session::RelaySession;
pub use typing::TypingUseCase;
