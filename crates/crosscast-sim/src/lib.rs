//! # Crosscast Sim
//!
//! Deterministic in-process context trees for exercising the broadcast
//! protocol. Each simulated context owns a real [`crosscast_bus::LocalBus`]
//! and a real [`crosscast_protocol::BroadcastService`]; the tree wires them
//! together through a shared FIFO message router standing in for the
//! isolation-boundary transport.
//!
//! Delivery is pull-based: sends enqueue fire-and-forget, and
//! [`SimTree::run_until_idle`] drains the queue until propagation
//! terminates. That makes multi-context assertions exact — no sleeps, no
//! races — while preserving the protocol's cooperative concurrency model:
//! within one context, broadcast and inbound handling never interleave.
//!
//! Links can be blocked to model cross-trust-boundary send failures, and
//! contexts can be closed to model torn-down endpoints.

pub mod adapters;
pub mod tree;

pub use adapters::{BusDispatcher, CountingDispatcher, NodeTopology, NodeTransport};
pub use tree::{SimNode, SimTree};
