//! # Broadcast Envelope
//!
//! The unit of propagation. A broadcast travels between contexts as a
//! [`BroadcastEnvelope`] wrapped in a [`WireMessage`] — a single
//! `_broadcast` top-level key — so the transport's generic message channel
//! can be shared with unrelated traffic without collision.
//!
//! ## Invariants
//!
//! - `origin_id` is stamped by the context that first created the broadcast
//!   and is preserved unchanged across every relay hop.
//! - `broadcast_ids` is append-only: each hop that forwards the envelope
//!   appends at most one dedup token and never rewrites earlier ones.

use crate::identity::OriginId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level wire key carrying the envelope.
pub const WIRE_KEY: &str = "_broadcast";

/// Payload key stamped with the originating context's identity.
pub const ORIGIN_KEY: &str = "_originId";

/// Payload key stamped with the targeted context's identity, when any.
pub const TARGET_KEY: &str = "_targetId";

/// Prefix marking a sealed (in-transit encrypted) detail.
pub const SEAL_MARKER: &str = "BE:";

/// Event names must carry a namespace: `"ns:event"`.
pub const NAMESPACE_SEPARATOR: char = ':';

/// A broadcast payload: either a structured mapping, or — while sealed for
/// transit — an opaque encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    /// Structured payload, string keys to arbitrary JSON values.
    Plain(Map<String, Value>),
    /// Opaque ciphertext produced by the payload cipher.
    Sealed(String),
}

impl Detail {
    /// An empty structured payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::Plain(Map::new())
    }

    /// True when the detail is in its sealed transit form.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed(_))
    }

    /// Borrow the structured payload, if not sealed.
    #[must_use]
    pub fn as_plain(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Plain(map) => Some(map),
            Self::Sealed(_) => None,
        }
    }

    /// The detail as a plain JSON value (object or string).
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Plain(map) => Value::Object(map.clone()),
            Self::Sealed(text) => Value::String(text.clone()),
        }
    }
}

impl Default for Detail {
    fn default() -> Self {
        Self::empty()
    }
}

/// The propagated broadcast record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEnvelope {
    /// Namespaced event name, e.g. `"cart:updated"`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// The payload, plain or sealed.
    pub detail: Detail,

    /// Identity of the context that first created this broadcast.
    pub origin_id: OriginId,

    /// When present, only the context whose own identity matches fires the
    /// notification locally. Relaying is never gated by this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<OriginId>,

    /// Ordered dedup tokens, one appended per forwarding hop.
    #[serde(default)]
    pub broadcast_ids: Vec<String>,

    /// Carried so every hop agrees whether to emit diagnostics.
    #[serde(default)]
    pub debug: bool,
}

impl BroadcastEnvelope {
    /// Wrap the envelope for transit.
    #[must_use]
    pub fn into_wire(self) -> WireMessage {
        WireMessage { broadcast: self }
    }
}

/// The single-key transit wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// The envelope, under the [`WIRE_KEY`] top-level key.
    #[serde(rename = "_broadcast")]
    pub broadcast: BroadcastEnvelope,
}

impl WireMessage {
    /// Serialize to the raw JSON value handed to the transport.
    #[must_use]
    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// True when `name` carries a namespace separator.
#[must_use]
pub fn has_namespace(name: &str) -> bool {
    name.contains(NAMESPACE_SEPARATOR)
}

/// Recover an envelope from a raw inbound transport value.
///
/// Returns `None` for anything that is not a broadcast: a value without the
/// [`WIRE_KEY`] key, an envelope that fails to deserialize, or an event
/// type lacking the namespace separator. Callers ignore such messages —
/// the channel is shared with unrelated traffic.
#[must_use]
pub fn unwrap_wire(raw: &Value) -> Option<BroadcastEnvelope> {
    let inner = raw.get(WIRE_KEY)?;
    let envelope: BroadcastEnvelope = serde_json::from_value(inner.clone()).ok()?;
    if !has_namespace(&envelope.event_type) {
        return None;
    }
    Some(envelope)
}
