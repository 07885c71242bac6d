//! # Origin Identities
//!
//! Every context computes one [`OriginId`] at initialization and keeps it
//! for its whole lifetime. The id answers two questions for the rest of the
//! protocol: "whose broadcast is this" (the envelope's `origin_id`) and
//! "who should receive a targeted broadcast" (the envelope's `target_id`).
//!
//! Ids are minted by feeding a collision-unfriendly seed (the context's
//! location, the current high-resolution time, and a random draw) through
//! the deterministic string hash in [`hash36`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// Deterministic string hash: FNV-1a-style rolling hash over UTF-16 code
/// units, rendered base-36.
///
/// Each code unit is XORed into the accumulator, then mixed with a fixed
/// combination of shift-and-add operations. Not cryptographic; the protocol
/// only needs determinism and a low collision probability, and never feeds
/// the same input twice (inputs always include a timestamp and a random
/// draw).
#[must_use]
pub fn hash36(input: &str) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for unit in input.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash
            .wrapping_add(hash << 1)
            .wrapping_add(hash << 4)
            .wrapping_add(hash << 7)
            .wrapping_add(hash << 8)
            .wrapping_add(hash << 24);
    }
    to_base36(hash)
}

/// Render a 32-bit value in lowercase base-36.
fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(7);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    // Digits are ASCII by construction.
    String::from_utf8(out).unwrap_or_default()
}

/// Unique-per-context identifier, stable for the context's lifetime.
///
/// Serializes transparently as its base-36 string so envelopes stay
/// readable on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginId(String);

impl OriginId {
    /// Mint a fresh origin identity for a context at the given location.
    ///
    /// The seed mixes the location with the current high-resolution time
    /// and a random draw, so two contexts minting at the same instant still
    /// diverge.
    #[must_use]
    pub fn mint(location: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let draw: u64 = rand::random();
        Self(hash36(&format!("{location}|{nanos}|{draw}")))
    }

    /// Wrap an already-minted id, e.g. one recovered from a relayed payload.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The base-36 rendering of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id carries no usable key material.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OriginId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Opaque process-local handle for a context endpoint.
///
/// Topology and transport ports speak in `ContextId`s; equality on the
/// handle is the "is this myself" test, so relays can skip self-sends and
/// the inbound handler can drop messages echoed back by its own context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Allocate a fresh handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
