//! The simulated context tree and its shared message router.

use crate::adapters::{BusDispatcher, NodeTopology, NodeTransport};
use crosscast_bus::LocalBus;
use crosscast_protocol::{
    BroadcastService, InboundMessageHandler, ProtocolConfig, TransportError,
};
use crosscast_types::ContextId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Weak};
use tracing::trace;

/// The concrete service type every simulated context runs.
pub type SimService = BroadcastService<BusDispatcher, NodeTopology, NodeTransport>;

/// One queued point-to-point delivery.
struct Delivery {
    sender: ContextId,
    target: ContextId,
    message: Value,
}

/// Shared state of a simulated tree: topology registry, inbound handler
/// registry, pending deliveries, and blocked links.
pub struct SimNet {
    parents: Mutex<HashMap<ContextId, ContextId>>,
    children: Mutex<HashMap<ContextId, Vec<ContextId>>>,
    handlers: Mutex<HashMap<ContextId, Weak<dyn InboundMessageHandler>>>,
    queue: Mutex<VecDeque<Delivery>>,
    blocked: Mutex<HashSet<(ContextId, ContextId)>>,
}

impl SimNet {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            parents: Mutex::new(HashMap::new()),
            children: Mutex::new(HashMap::new()),
            handlers: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            blocked: Mutex::new(HashSet::new()),
        })
    }

    pub(crate) fn parent_of(&self, id: ContextId) -> Option<ContextId> {
        self.parents.lock().get(&id).copied()
    }

    pub(crate) fn children_of(&self, id: ContextId) -> Vec<ContextId> {
        self.children.lock().get(&id).cloned().unwrap_or_default()
    }

    /// Accept a send from `sender` to `target`, honoring blocked links and
    /// closed endpoints.
    pub(crate) fn enqueue(
        &self,
        sender: ContextId,
        target: ContextId,
        message: Value,
    ) -> Result<(), TransportError> {
        if self.blocked.lock().contains(&(sender, target)) {
            return Err(TransportError::Rejected);
        }
        if !self.handlers.lock().contains_key(&target) {
            return Err(TransportError::Closed);
        }
        self.queue.lock().push_back(Delivery {
            sender,
            target,
            message,
        });
        Ok(())
    }
}

/// A simulated context: its handle, its local bus, and its protocol engine.
#[derive(Clone)]
pub struct SimNode {
    /// Endpoint handle within the tree.
    pub id: ContextId,
    /// The context's local event facility.
    pub bus: Arc<LocalBus>,
    /// The context's broadcast protocol engine.
    pub service: Arc<SimService>,
}

/// Builder and driver for an in-process context tree.
pub struct SimTree {
    net: Arc<SimNet>,
    nodes: HashMap<ContextId, SimNode>,
}

impl SimTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            net: SimNet::new(),
            nodes: HashMap::new(),
        }
    }

    /// Add a top-level context.
    pub fn add_root(&mut self, location: &str) -> SimNode {
        self.add_node(location, None)
    }

    /// Add a context embedded under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this tree (test-harness misuse).
    pub fn add_child(&mut self, parent: ContextId, location: &str) -> SimNode {
        assert!(
            self.nodes.contains_key(&parent),
            "unknown parent context {parent}"
        );
        self.add_node(location, Some(parent))
    }

    fn add_node(&mut self, location: &str, parent: Option<ContextId>) -> SimNode {
        let id = ContextId::new();
        let bus = Arc::new(LocalBus::new());
        let service = Arc::new(BroadcastService::new(
            ProtocolConfig::at_location(location),
            id,
            Arc::new(BusDispatcher::new(bus.clone())),
            Arc::new(NodeTopology::new(self.net.clone(), id)),
            Arc::new(NodeTransport::new(self.net.clone(), id)),
        ));

        if let Some(parent) = parent {
            self.net.parents.lock().insert(id, parent);
            self.net.children.lock().entry(parent).or_default().push(id);
        }
        let handler: Arc<dyn InboundMessageHandler> = service.clone();
        self.net.handlers.lock().insert(id, Arc::downgrade(&handler));

        let node = SimNode { id, bus, service };
        self.nodes.insert(id, node.clone());
        node
    }

    /// Look up a node by handle.
    #[must_use]
    pub fn node(&self, id: ContextId) -> Option<&SimNode> {
        self.nodes.get(&id)
    }

    /// Every node in the tree.
    pub fn nodes(&self) -> impl Iterator<Item = &SimNode> {
        self.nodes.values()
    }

    /// Number of edges in the tree.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.net.parents.lock().len()
    }

    /// Block the directed link from `sender` to `target`; subsequent sends
    /// over it fail as trust-boundary rejections.
    pub fn block_link(&self, sender: ContextId, target: ContextId) {
        self.net.blocked.lock().insert((sender, target));
    }

    /// Close a context: it stops accepting deliveries, and sends to it fail.
    pub fn close(&self, id: ContextId) {
        self.net.handlers.lock().remove(&id);
    }

    /// Drain pending deliveries until the tree goes quiet.
    ///
    /// Returns the number of point-to-point deliveries processed. The loop
    /// terminates because every context's dedup cache suppresses echoes of
    /// broadcasts it already relayed.
    pub fn run_until_idle(&self) -> usize {
        let mut delivered = 0;
        loop {
            let Some(delivery) = self.net.queue.lock().pop_front() else {
                return delivered;
            };
            delivered += 1;

            let handler = self
                .net
                .handlers
                .lock()
                .get(&delivery.target)
                .and_then(Weak::upgrade);
            match handler {
                Some(handler) => handler.handle_message(delivery.sender, &delivery.message),
                None => trace!(target = %delivery.target, "Delivery to closed context dropped"),
            }
        }
    }
}

impl Default for SimTree {
    fn default() -> Self {
        Self::new()
    }
}
