//! Session router
//!
//! The behavioral core of the relay. Every connection moves through
//! `Unjoined -> Joined -> Closed`; the router binds joined connections to
//! role slots in the session table, forwards payloads to the opposite
//! role, and propagates departures.
//!
//! All events for all connections arrive on a single channel and are
//! processed one at a time, so the table and the per-connection state
//! are never touched concurrently. Emits go through the connection
//! registry and never block.
//!
//! Nothing here is fatal: every bad input is dropped with a diagnostic
//! and no error is ever sent back to the originating connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pl_protocol::{ClientMessage, Role, ServerMessage, SessionId};

use crate::config::DisplacementPolicy;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::session::SessionTable;

/// Inbound events delivered by the transport layer, one per connection
/// lifecycle step
#[derive(Debug)]
pub enum RouterEvent {
    /// A decoded message from a connection
    Inbound {
        id: ConnectionId,
        message: ClientMessage,
    },
    /// The underlying connection became permanently unusable.
    /// The transport delivers this exactly once per connection.
    Disconnected { id: ConnectionId },
}

/// Why an inbound event was dropped.
///
/// Each reason produces one diagnostic and nothing else: the event is
/// discarded, no error reaches the peer, and no connection is closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Join missing its session ID or role, or the role did not parse
    #[error("join is missing a valid sessionId or role")]
    MalformedJoin,

    /// Message from a connection that never joined a session
    #[error("message from a connection with no session")]
    UnjoinedMessage,

    /// The connection's session is not in the table
    #[error("session not found")]
    UnknownSession,

    /// The opposite role slot is empty at message time
    #[error("no relay target in session")]
    NoRelayTarget,

    /// Disconnect for a connection already displaced from its slot
    #[error("stale disconnect for a displaced connection")]
    StaleDisconnect,

    /// Join refused because the slot is occupied and policy is reject
    #[error("role already occupied")]
    RoleOccupied,
}

/// Per-connection state, recorded at join time
#[derive(Debug, Clone)]
struct PeerState {
    session_id: SessionId,
    role: Role,
    joined_at: Instant,
}

/// The session router.
///
/// Owns the session table and the per-connection state outright; runs as
/// a single task draining one event channel.
pub struct Router {
    table: SessionTable,
    peers: HashMap<ConnectionId, PeerState>,
    registry: Arc<ConnectionRegistry>,
    policy: DisplacementPolicy,
}

impl Router {
    /// Create a new router emitting through the given registry
    pub fn new(registry: Arc<ConnectionRegistry>, policy: DisplacementPolicy) -> Self {
        Self {
            table: SessionTable::new(),
            peers: HashMap::new(),
            registry,
            policy,
        }
    }

    /// Drain the event channel until it closes or shutdown is requested
    pub async fn run(mut self, mut events: mpsc::Receiver<RouterEvent>, cancel: CancellationToken) {
        tracing::debug!("Session router started");

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.handle(event),
                        None => break,
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!("Session router shutting down");
                    break;
                }
            }
        }
    }

    /// Process a single event
    pub fn handle(&mut self, event: RouterEvent) {
        match event {
            RouterEvent::Inbound { id, message } => match message {
                ClientMessage::Join { session_id, role } => self.handle_join(id, session_id, role),
                ClientMessage::Message { payload } => self.handle_message(id, payload),
            },
            RouterEvent::Disconnected { id } => self.handle_disconnect(id),
        }
    }

    /// Number of sessions currently in the table
    pub fn session_count(&self) -> usize {
        self.table.len()
    }

    fn handle_join(&mut self, id: ConnectionId, session_id: Option<String>, role: Option<String>) {
        let (session_id, role) = match (session_id, role) {
            (Some(s), Some(r)) if !s.is_empty() => match r.parse::<Role>() {
                Ok(role) => (SessionId::new(s), role),
                Err(_) => return self.drop_event(&id, DropReason::MalformedJoin),
            },
            _ => return self.drop_event(&id, DropReason::MalformedJoin),
        };

        if self.policy == DisplacementPolicy::Reject {
            if let Some(record) = self.table.get(&session_id) {
                if record.occupant(role).is_some_and(|occupant| *occupant != id) {
                    return self.drop_event(&id, DropReason::RoleOccupied);
                }
            }
        }

        // A connection re-joining elsewhere vacates its previous slot, so
        // it never occupies two slots at once.
        if let Some(prev) = self.peers.get(&id).cloned() {
            if prev.session_id != session_id || prev.role != role {
                self.release_slot(&id, &prev.session_id, prev.role);
            }
        }

        self.peers.insert(
            id.clone(),
            PeerState {
                session_id: session_id.clone(),
                role,
                joined_at: Instant::now(),
            },
        );

        let record = self.table.get_or_create(&session_id);
        if let Some(displaced) = record.set(role, id.clone()) {
            if displaced != id {
                tracing::info!(
                    conn = %displaced,
                    session = %session_id,
                    %role,
                    "Displaced by a later join"
                );
                self.registry.send(&displaced, ServerMessage::Displaced);
                // The displaced connection keeps its own state; its
                // eventual disconnect is absorbed by the stale guard.
            }
        }

        tracing::info!(conn = %id, session = %session_id, %role, "Joined session");

        // Re-fires on every join that completes the pairing, which
        // re-synchronizes both sides after a reconnect.
        if record.is_ready() {
            for slot_role in [Role::Idle, Role::Controller] {
                if let Some(occupant) = record.occupant(slot_role) {
                    self.registry.send(occupant, ServerMessage::Ready);
                }
            }
            tracing::debug!(session = %session_id, "Session ready");
        }
    }

    fn handle_message(&mut self, id: ConnectionId, payload: serde_json::Value) {
        let Some(peer) = self.peers.get(&id) else {
            return self.drop_event(&id, DropReason::UnjoinedMessage);
        };

        let Some(record) = self.table.get(&peer.session_id) else {
            return self.drop_event(&id, DropReason::UnknownSession);
        };

        // The target is resolved fresh at message time, not cached at join.
        let Some(target) = record.occupant(peer.role.opposite()) else {
            return self.drop_event(&id, DropReason::NoRelayTarget);
        };

        tracing::debug!(from = %id, to = %target, session = %peer.session_id, "Relaying message");
        self.registry.send(target, ServerMessage::Message { payload });
    }

    fn handle_disconnect(&mut self, id: ConnectionId) {
        // A connection that never joined carries no session state.
        let Some(peer) = self.peers.remove(&id) else {
            tracing::debug!(conn = %id, "Disconnect before join");
            return;
        };

        tracing::info!(
            conn = %id,
            session = %peer.session_id,
            role = %peer.role,
            joined_for = ?peer.joined_at.elapsed(),
            "Disconnected"
        );
        self.release_slot(&id, &peer.session_id, peer.role);
    }

    /// Clear the slot held by `id`, notify the surviving occupant, and
    /// reap the record once both slots are empty.
    fn release_slot(&mut self, id: &ConnectionId, session_id: &SessionId, role: Role) {
        let Some(record) = self.table.get_mut(session_id) else {
            return self.drop_event(id, DropReason::UnknownSession);
        };

        if !record.clear_if(role, id) {
            return self.drop_event(id, DropReason::StaleDisconnect);
        }

        if let Some(survivor) = record.occupant(role.opposite()) {
            self.registry.send(survivor, ServerMessage::PeerDisconnected);
        }

        if record.is_vacant() {
            self.table.remove(session_id);
            tracing::debug!(session = %session_id, "Removed vacant session");
        }
    }

    fn drop_event(&self, id: &ConnectionId, reason: DropReason) {
        tracing::warn!(conn = %id, "Dropped event: {}", reason);
    }
}
