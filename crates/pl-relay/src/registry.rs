//! Connection registry
//!
//! Tracks the outbound queue of every live WebSocket connection so the
//! router can emit events to a specific peer. Delivery is fire-and-forget:
//! a full or closed queue drops the event with a warning, matching the
//! relay's best-effort model.

use dashmap::DashMap;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

use pl_protocol::ServerMessage;

/// Capacity of each connection's outbound queue
const OUTBOUND_QUEUE: usize = 256;

/// Stable identity for a connection, valid for its lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub(crate) fn new() -> Self {
        Self(format!("conn-{}", Uuid::new_v4().simple()))
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of all live connections, indexed by connection ID
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
}

impl ConnectionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection, returning its ID and the receiving end
    /// of its outbound queue
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        self.connections.insert(id.clone(), tx);
        (id, rx)
    }

    /// Remove a connection
    pub fn unregister(&self, id: &ConnectionId) {
        self.connections.remove(id);
    }

    /// Queue an event for a specific connection.
    ///
    /// Returns false if the connection is gone or its queue is full; the
    /// event is dropped either way.
    pub fn send(&self, id: &ConnectionId, message: ServerMessage) -> bool {
        let Some(tx) = self.connections.get(id) else {
            return false;
        };

        match tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn = %id, "Outbound queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
