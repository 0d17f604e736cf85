//! Session table
//!
//! Maps session identifiers to their role slots. The table is owned
//! exclusively by the router task, which processes one event at a time,
//! so no locking is needed here.

use std::collections::HashMap;

use pl_protocol::{Role, SessionId};

use crate::registry::ConnectionId;

/// One slot per role for a single session.
///
/// Invariant: each slot holds at most one connection, and a session is
/// "ready" when both slots are occupied.
#[derive(Debug, Default)]
pub struct SessionRecord {
    idle: Option<ConnectionId>,
    controller: Option<ConnectionId>,
}

impl SessionRecord {
    fn slot(&self, role: Role) -> &Option<ConnectionId> {
        match role {
            Role::Idle => &self.idle,
            Role::Controller => &self.controller,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<ConnectionId> {
        match role {
            Role::Idle => &mut self.idle,
            Role::Controller => &mut self.controller,
        }
    }

    /// Current occupant of a role slot
    pub fn occupant(&self, role: Role) -> Option<&ConnectionId> {
        self.slot(role).as_ref()
    }

    /// Occupy a role slot, returning the previous occupant if any
    pub fn set(&mut self, role: Role, id: ConnectionId) -> Option<ConnectionId> {
        self.slot_mut(role).replace(id)
    }

    /// Clear a role slot only if it still holds exactly `id`.
    ///
    /// Returns false when the slot holds a different connection (the
    /// caller was displaced) or is already empty.
    pub fn clear_if(&mut self, role: Role, id: &ConnectionId) -> bool {
        let slot = self.slot_mut(role);
        if slot.as_ref() == Some(id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Both slots occupied
    pub fn is_ready(&self) -> bool {
        self.idle.is_some() && self.controller.is_some()
    }

    /// Both slots empty
    pub fn is_vacant(&self) -> bool {
        self.idle.is_none() && self.controller.is_none()
    }
}

/// All sessions known to the relay, keyed by session identifier.
///
/// Records are created lazily on the first join that references an
/// unseen identifier and removed eagerly when the last occupant leaves,
/// so the table never accumulates vacant records.
#[derive(Debug, Default)]
pub struct SessionTable {
    records: HashMap<SessionId, SessionRecord>,
}

impl SessionTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for a session, creating an empty one if absent
    pub fn get_or_create(&mut self, id: &SessionId) -> &mut SessionRecord {
        self.records.entry(id.clone()).or_default()
    }

    /// Look up a session without creating it
    pub fn get(&self, id: &SessionId) -> Option<&SessionRecord> {
        self.records.get(id)
    }

    /// Mutable lookup without creation
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut SessionRecord> {
        self.records.get_mut(id)
    }

    /// Remove a session record
    pub fn remove(&mut self, id: &SessionId) -> Option<SessionRecord> {
        self.records.remove(id)
    }

    /// Number of sessions in the table
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(_n: u32) -> ConnectionId {
        ConnectionId::new()
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut table = SessionTable::new();
        let id = SessionId::new("s1");

        table.get_or_create(&id);
        table.get_or_create(&id);
        assert_eq!(table.len(), 1);

        let record = table.get(&id).unwrap();
        assert!(record.is_vacant());
        assert!(!record.is_ready());
    }

    #[test]
    fn test_get_does_not_create() {
        let table = SessionTable::new();
        assert!(table.get(&SessionId::new("missing")).is_none());
    }

    #[test]
    fn test_set_returns_displaced_occupant() {
        let mut record = SessionRecord::default();
        let first = conn(1);
        let second = conn(2);

        assert!(record.set(Role::Controller, first.clone()).is_none());
        let displaced = record.set(Role::Controller, second.clone());
        assert_eq!(displaced, Some(first));
        assert_eq!(record.occupant(Role::Controller), Some(&second));
    }

    #[test]
    fn test_ready_requires_both_roles() {
        let mut record = SessionRecord::default();
        record.set(Role::Idle, conn(1));
        assert!(!record.is_ready());

        record.set(Role::Controller, conn(2));
        assert!(record.is_ready());
    }

    #[test]
    fn test_clear_if_guards_against_stale_clears() {
        let mut record = SessionRecord::default();
        let first = conn(1);
        let second = conn(2);

        record.set(Role::Idle, first.clone());
        record.set(Role::Idle, second.clone());

        // The displaced connection must not clear the slot.
        assert!(!record.clear_if(Role::Idle, &first));
        assert_eq!(record.occupant(Role::Idle), Some(&second));

        assert!(record.clear_if(Role::Idle, &second));
        assert!(record.occupant(Role::Idle).is_none());
        assert!(!record.clear_if(Role::Idle, &second));
    }
}
