//! pl-relay: Session pairing and relay daemon
//!
//! The relay accepts WebSocket connections, binds each one to a session
//! under one of two roles, and forwards opaque payloads to the opposite
//! role. It notifies both sides when a pairing completes and the
//! survivor when its peer drops.

pub mod config;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;

pub use config::{DisplacementPolicy, RelayConfig};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use router::{Router, RouterEvent};
pub use session::SessionTable;
