//! Inbound ports (API) for the broadcast protocol.

use crate::domain::{BroadcastOptions, BroadcastOutcome};
use crate::events::BroadcastError;
use crosscast_types::{ContextId, OriginId};
use serde_json::Value;

/// The public broadcast call surface.
pub trait BroadcastApi: Send + Sync {
    /// Broadcast a notification tree-wide.
    ///
    /// Fires the notification on this context's local event facility
    /// (subject to targeting), then relays the envelope to the parent and
    /// every child context. The call is fire-and-forget with respect to
    /// delivery: it never blocks on descendants processing the broadcast.
    ///
    /// # Errors
    ///
    /// - [`BroadcastError::InvalidEventName`] when `name` lacks the
    ///   namespace separator.
    /// - [`BroadcastError::InvalidPayload`] when `data` is provided but is
    ///   not a structured mapping.
    /// - [`BroadcastError::MissingCipherKey`] when encryption is requested
    ///   without a derivable key.
    ///
    /// All errors are raised before any local fire or relay.
    fn broadcast(
        &self,
        name: &str,
        data: Option<Value>,
        options: BroadcastOptions,
    ) -> Result<BroadcastOutcome, BroadcastError>;

    /// This context's origin identity.
    fn origin_id(&self) -> &OriginId;
}

/// Handle for messages delivered by the transport.
pub trait InboundMessageHandler: Send + Sync {
    /// Process one inbound raw message.
    ///
    /// Non-broadcast traffic, self-echoes, and malformed envelopes are
    /// silently ignored; decrypt failures degrade the payload to empty.
    /// Nothing in this path is fatal to the context.
    fn handle_message(&self, sender: ContextId, raw: &Value);
}
