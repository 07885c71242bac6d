//! # Shared Types Crate
//!
//! Domain types shared by every Crosscast crate: the deterministic string
//! hash, origin identities, context handles, and the broadcast envelope
//! with its wire wrapper.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-crate type is defined here.
//! - **Envelope Integrity**: `origin_id` is stamped once at creation and is
//!   never rewritten by a relay hop; `broadcast_ids` only ever grows.
//! - **Wire Isolation**: the transport channel is shared with unrelated
//!   traffic, so every broadcast travels under the single `_broadcast` key.

pub mod envelope;
pub mod identity;

pub use envelope::{
    unwrap_wire, BroadcastEnvelope, Detail, WireMessage, NAMESPACE_SEPARATOR, ORIGIN_KEY,
    SEAL_MARKER, TARGET_KEY, WIRE_KEY,
};
pub use identity::{hash36, ContextId, OriginId};
