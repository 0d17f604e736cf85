//! Message types for the PairLink protocol
//!
//! Messages are JSON objects tagged with a `type` field, one per
//! WebSocket text frame.
//!
//! # Message Flow
//!
//! Typical sequence for a session:
//!
//! 1. Peer connects and sends `join` with a session ID and role
//! 2. Once both roles are occupied, the relay sends `ready` to both peers
//! 3. `message` payloads flow through the relay to the opposite role
//! 4. When one peer drops, the survivor receives `peer-disconnected`
//!
//! Join fields are deliberately optional on the wire: a join missing
//! either field still decodes, and is rejected with a diagnostic by the
//! router instead of failing the frame.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Messages sent by a peer to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Bind this connection to a session under a role
    #[serde(rename_all = "camelCase")]
    Join {
        /// Opaque session identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        /// "idle" or "controller"
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },

    /// Opaque payload to forward to the opposite role
    Message {
        /// Arbitrary JSON, relayed verbatim
        payload: serde_json::Value,
    },
}

/// Messages sent by the relay to a specific peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Both roles of the session are now occupied
    Ready,

    /// Payload forwarded from the opposite role
    Message {
        /// The sender's payload, unmodified
        payload: serde_json::Value,
    },

    /// The opposite role's connection was lost
    PeerDisconnected,

    /// This connection was evicted from its slot by a later join
    Displaced,
}

impl ClientMessage {
    /// Decode a single text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerMessage {
    /// Encode into a single text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
