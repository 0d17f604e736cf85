//! pl-protocol: Wire protocol for PairLink session pairing
//!
//! This crate defines the JSON messages exchanged between peers and the
//! relay over WebSocket text frames. Each frame carries exactly one
//! tagged JSON object.

pub mod error;
pub mod message;
pub mod role;
pub mod session;

pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage};
pub use role::Role;
pub use session::SessionId;
