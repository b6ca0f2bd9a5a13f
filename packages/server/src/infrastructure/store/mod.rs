//! Message Store implementations.
//!
//! - `inmemory`: process-local store used by the binary and tests

pub mod inmemory;

pub use inmemory::InMemoryMessageStore;
