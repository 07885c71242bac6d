//! Shared fixtures for protocol-level integration tests.
//!
//! The sim crate drives whole trees through a router; these fixtures
//! instead wire individual `BroadcastService` instances by hand with
//! capturing ports, so tests can inspect the raw wire messages between
//! hops — envelope fields, sealed details, token growth.

use crosscast_protocol::{
    BroadcastService, EventDispatcher, ProtocolConfig, RelayTransport, TransportError,
    TreeTopology,
};
use crosscast_types::ContextId;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Dispatcher recording every local fire.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub fired: Mutex<Vec<(String, Value)>>,
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, name: &str, detail: &Value) -> usize {
        self.fired.lock().push((name.to_string(), detail.clone()));
        1
    }
}

/// Fixed tree position.
pub struct StaticTopology {
    pub parent: Option<ContextId>,
    pub children: Vec<ContextId>,
}

impl TreeTopology for StaticTopology {
    fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    fn children(&self) -> Vec<ContextId> {
        self.children.clone()
    }
}

/// Transport capturing every outbound wire message.
#[derive(Default)]
pub struct CaptureTransport {
    pub sent: Mutex<Vec<(ContextId, Value)>>,
}

impl CaptureTransport {
    /// Take and clear the captured sends.
    pub fn take(&self) -> Vec<(ContextId, Value)> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl RelayTransport for CaptureTransport {
    fn send(&self, target: &ContextId, message: Value) -> Result<(), TransportError> {
        self.sent.lock().push((*target, message));
        Ok(())
    }
}

/// A hand-wired context: service plus handles to its capturing ports.
pub struct ChainContext {
    pub id: ContextId,
    pub service: BroadcastService<RecordingDispatcher, StaticTopology, CaptureTransport>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub transport: Arc<CaptureTransport>,
}

/// Build a context at a fixed tree position.
pub fn chain_context(
    location: &str,
    id: ContextId,
    parent: Option<ContextId>,
    children: Vec<ContextId>,
) -> ChainContext {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let transport = Arc::new(CaptureTransport::default());
    let service = BroadcastService::new(
        ProtocolConfig::at_location(location),
        id,
        dispatcher.clone(),
        Arc::new(StaticTopology { parent, children }),
        transport.clone(),
    );
    ChainContext {
        id,
        service,
        dispatcher,
        transport,
    }
}

/// A root → child → grandchild chain with capturing ports at every hop.
pub struct ThreeHopChain {
    pub root: ChainContext,
    pub child: ChainContext,
    pub grandchild: ChainContext,
}

impl ThreeHopChain {
    pub fn new() -> Self {
        let root_id = ContextId::new();
        let child_id = ContextId::new();
        let grandchild_id = ContextId::new();

        Self {
            root: chain_context("chain:root", root_id, None, vec![child_id]),
            child: chain_context("chain:child", child_id, Some(root_id), vec![grandchild_id]),
            grandchild: chain_context("chain:grandchild", grandchild_id, Some(child_id), vec![]),
        }
    }
}

impl Default for ThreeHopChain {
    fn default() -> Self {
        Self::new()
    }
}
