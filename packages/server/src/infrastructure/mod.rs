//! Infrastructure layer: concrete relay state, collaborators and wire formats.

pub mod connection;
pub mod dto;
pub mod identity;
pub mod registry;
pub mod router;
pub mod store;

pub use connection::{Connection, OutboundSender};
pub use registry::ConnectionRegistry;
pub use router::{BroadcastReport, Departure, RoomGuard, RoomRouter, RouterError};
