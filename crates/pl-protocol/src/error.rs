//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding wire messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame was not valid JSON or did not match any message shape
    #[error("Malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    /// Role string was neither "idle" nor "controller"
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
