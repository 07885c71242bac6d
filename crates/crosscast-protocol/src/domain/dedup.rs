//! # Relay Dedup Cache
//!
//! Loop suppression for the propagation protocol. Every context that
//! forwards an envelope mints one dedup token and records it here; when the
//! same broadcast loops back around the tree, the carried tokens collide
//! with the recorded set and the echo is suppressed before it can fan out
//! again.
//!
//! A context only ever checks tokens minted by *other* contexts against the
//! set it minted itself — payloads are never compared.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-context cache of minted dedup tokens.
///
/// Entries expire after a fixed window (30 seconds by default, long enough
/// to outlive any plausible propagation delay across a deep tree while
/// bounding memory) and are purged lazily on the next cache access.
pub struct RelayDedupCache {
    /// Token -> when it was recorded.
    entries: HashMap<String, Instant>,

    /// Entry lifetime.
    ttl: Duration,
}

impl RelayDedupCache {
    /// Default entry lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

    /// Create a cache with the default expiry window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    /// Create a cache with a custom expiry window.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Check carried tokens against the set this context minted.
    ///
    /// Returns `true` when any carried token is still live in the cache,
    /// i.e. the broadcast is an echo of one this context already relayed.
    pub fn suppresses(&mut self, carried: &[String]) -> bool {
        self.purge_expired();
        carried.iter().any(|token| self.entries.contains_key(token))
    }

    /// Record a freshly minted token.
    pub fn record(&mut self, token: String) {
        self.purge_expired();
        self.entries.insert(token, Instant::now());
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries older than the expiry window.
    fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, recorded| recorded.elapsed() < ttl);
    }
}

impl Default for RelayDedupCache {
    fn default() -> Self {
        Self::new()
    }
}
