//! # Bus Events
//!
//! The unit of local dispatch and the filters subscriptions match against.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace separator inside event names.
pub const NAMESPACE_SEPARATOR: char = ':';

/// A named notification with an arbitrary structured payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    /// Namespaced event name, e.g. `"cart:updated"`.
    pub name: String,

    /// Arbitrary payload; the bus never inspects it.
    pub detail: Value,
}

impl BusEvent {
    /// Build an event.
    #[must_use]
    pub fn new(name: impl Into<String>, detail: Value) -> Self {
        Self {
            name: name.into(),
            detail,
        }
    }

    /// The portion of the name before the namespace separator, when any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.name.split_once(NAMESPACE_SEPARATOR).map(|(ns, _)| ns)
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Exact names to include. Empty means all names.
    pub names: Vec<String>,
    /// Namespaces to include. Empty means all namespaces.
    pub namespaces: Vec<String>,
}

impl EventFilter {
    /// A filter that accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter for one exact event name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            namespaces: Vec::new(),
        }
    }

    /// A filter for every event under a namespace.
    #[must_use]
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            names: Vec::new(),
            namespaces: vec![namespace.into()],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BusEvent) -> bool {
        let name_match = self.names.is_empty() || self.names.iter().any(|n| *n == event.name);

        let namespace_match = self.namespaces.is_empty()
            || event
                .namespace()
                .is_some_and(|ns| self.namespaces.iter().any(|want| want == ns));

        name_match && namespace_match
    }
}
