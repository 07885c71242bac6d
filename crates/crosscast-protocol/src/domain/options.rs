//! Value objects: protocol configuration, per-call options, and the
//! broadcast outcome report.

use crosscast_types::OriginId;
use std::time::Duration;

use super::dedup::RelayDedupCache;

/// Per-context protocol configuration.
#[derive(Clone, Debug)]
pub struct ProtocolConfig {
    /// Human-readable location of the context, mixed into the origin
    /// identity seed (e.g. a page address or an embedding path).
    pub location: String,

    /// Dedup cache entry lifetime.
    pub dedup_ttl: Duration,
}

impl ProtocolConfig {
    /// Configuration for a context at the given location.
    #[must_use]
    pub fn at_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            location: "context".to_string(),
            dedup_ttl: RelayDedupCache::DEFAULT_TTL,
        }
    }
}

/// Per-call broadcast options.
///
/// Every recognized option is an explicit field with a default; there is no
/// duck-typed options bag.
#[derive(Clone, Debug, Default)]
pub struct BroadcastOptions {
    /// Seal the payload before relaying (local firing stays plaintext).
    pub encrypt: bool,

    /// Restrict local firing to the context holding this identity.
    pub target: Option<OriginId>,

    /// Emit per-broadcast diagnostics at every hop.
    pub debug: bool,
}

impl BroadcastOptions {
    /// Options targeting one specific context.
    #[must_use]
    pub fn targeted(target: OriginId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    /// Options sealing the payload in transit.
    #[must_use]
    pub fn sealed() -> Self {
        Self {
            encrypt: true,
            ..Self::default()
        }
    }

    /// Enable per-broadcast diagnostics.
    #[must_use]
    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

/// What one broadcast call actually did at this hop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// The dedup token this hop minted, when it forwarded the envelope.
    pub broadcast_id: Option<String>,

    /// The broadcast was a suppressed echo; nothing fired, nothing relayed.
    pub suppressed: bool,

    /// The notification fired on this context's local event facility.
    pub fired_locally: bool,

    /// Relay targets attempted (parent + children, self excluded).
    pub relays_attempted: usize,

    /// Relay sends that failed and were skipped.
    pub relays_failed: usize,
}

impl BroadcastOutcome {
    /// Outcome for a suppressed echo.
    #[must_use]
    pub fn suppressed() -> Self {
        Self {
            suppressed: true,
            ..Self::default()
        }
    }
}
