//! Participant roles within a session

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two fixed participant kinds within a session.
///
/// The roles are symmetric opposites: each role's relay target is the
/// other role's current occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The passive side of a pairing (e.g. a display waiting to be driven)
    Idle,
    /// The active side of a pairing
    Controller,
}

impl Role {
    /// The opposite role, i.e. the relay target for this role's messages.
    pub fn opposite(&self) -> Role {
        match self {
            Role::Idle => Role::Controller,
            Role::Controller => Role::Idle,
        }
    }

    /// The wire representation of this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Idle => "idle",
            Role::Controller => "controller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Role::Idle),
            "controller" => Ok(Role::Controller),
            other => Err(crate::ProtocolError::UnknownRole(other.to_string())),
        }
    }
}
