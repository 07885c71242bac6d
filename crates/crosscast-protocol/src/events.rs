//! Error types for the broadcast protocol.

use thiserror::Error;

/// Caller-visible broadcast failures.
///
/// All of these are raised synchronously, before any local fire or relay.
/// Everything past the entry-point validation degrades a single hop instead
/// of failing the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// Event names must carry a namespace separator, e.g. `"cart:updated"`.
    #[error("Invalid event name {name:?}: missing namespace separator")]
    InvalidEventName { name: String },

    /// Payloads must be structured mappings (string keys to values).
    #[error("Invalid payload: broadcast data must be a structured mapping")]
    InvalidPayload,

    /// Encryption was requested but no cipher key is derivable.
    #[error("Encryption requested without a derivable cipher key")]
    MissingCipherKey,
}

/// Per-target relay failures, caught and logged at the send step.
///
/// A failed send never aborts the fan-out to the remaining relay targets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The target context no longer accepts messages.
    #[error("Target context is closed")]
    Closed,

    /// The message was rejected across a trust boundary.
    #[error("Send rejected across trust boundary")]
    Rejected,
}
