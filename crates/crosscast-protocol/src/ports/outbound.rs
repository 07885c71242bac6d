//! Outbound ports (SPI) for the broadcast protocol.
//!
//! The hosting environment provides these three collaborators: the local
//! event facility, the tree topology, and the point-to-point transport.
//! The protocol calls into them but implements none of them.

use crate::events::TransportError;
use crosscast_types::ContextId;
use serde_json::Value;

/// The context's local notification facility.
pub trait EventDispatcher: Send + Sync {
    /// Fire a notification to local subscribers.
    ///
    /// Returns the number of listeners that received it. Names containing
    /// the namespace separator must be supported.
    fn dispatch(&self, name: &str, detail: &Value) -> usize;
}

/// The context's position in the tree of contexts.
pub trait TreeTopology: Send + Sync {
    /// The embedding parent context, when this context is not the top of
    /// the tree.
    fn parent(&self) -> Option<ContextId>;

    /// Every directly embedded child context.
    fn children(&self) -> Vec<ContextId>;
}

/// The raw point-to-point channel crossing the isolation boundary.
///
/// Sends are asynchronous, one-way, and best-effort; a send may fail
/// silently across trust boundaries. Failures are reported per target and
/// never abort the fan-out to the remaining targets.
pub trait RelayTransport: Send + Sync {
    /// Send a raw message to one context.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the target rejects or is closed;
    /// callers log and continue.
    fn send(&self, target: &ContextId, message: Value) -> Result<(), TransportError>;
}
