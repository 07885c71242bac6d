//! Port adapters binding a simulated context to the shared tree state.

use crate::tree::SimNet;
use crosscast_bus::LocalBus;
use crosscast_protocol::{EventDispatcher, RelayTransport, TransportError, TreeTopology};
use crosscast_types::ContextId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatches protocol notifications onto the context's local bus.
pub struct BusDispatcher {
    bus: Arc<LocalBus>,
}

impl BusDispatcher {
    /// Wrap a bus as an [`EventDispatcher`] port.
    #[must_use]
    pub fn new(bus: Arc<LocalBus>) -> Self {
        Self { bus }
    }
}

impl EventDispatcher for BusDispatcher {
    fn dispatch(&self, name: &str, detail: &Value) -> usize {
        self.bus.dispatch(name, detail)
    }
}

/// Dispatcher that only counts fires, for tests that need exact local
/// delivery counts without a bus.
#[derive(Default)]
pub struct CountingDispatcher {
    fired: Mutex<HashMap<String, usize>>,
}

impl CountingDispatcher {
    /// Fresh counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the named event fired.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.fired.lock().get(name).copied().unwrap_or(0)
    }

    /// Total fires across all names.
    #[must_use]
    pub fn total(&self) -> usize {
        self.fired.lock().values().sum()
    }
}

impl EventDispatcher for CountingDispatcher {
    fn dispatch(&self, name: &str, _detail: &Value) -> usize {
        *self.fired.lock().entry(name.to_string()).or_insert(0) += 1;
        1
    }
}

/// Reads a context's tree position out of the shared registry.
///
/// Lookups happen at broadcast time, so re-parenting or adding children
/// after construction is visible to the next fan-out.
pub struct NodeTopology {
    net: Arc<SimNet>,
    id: ContextId,
}

impl NodeTopology {
    pub(crate) fn new(net: Arc<SimNet>, id: ContextId) -> Self {
        Self { net, id }
    }
}

impl TreeTopology for NodeTopology {
    fn parent(&self) -> Option<ContextId> {
        self.net.parent_of(self.id)
    }

    fn children(&self) -> Vec<ContextId> {
        self.net.children_of(self.id)
    }
}

/// Enqueues sends onto the shared router, stamped with the sending
/// context's handle.
pub struct NodeTransport {
    net: Arc<SimNet>,
    id: ContextId,
}

impl NodeTransport {
    pub(crate) fn new(net: Arc<SimNet>, id: ContextId) -> Self {
        Self { net, id }
    }
}

impl RelayTransport for NodeTransport {
    fn send(&self, target: &ContextId, message: Value) -> Result<(), TransportError> {
        self.net.enqueue(self.id, *target, message)
    }
}
