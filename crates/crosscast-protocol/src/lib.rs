//! # Crosscast Protocol
//!
//! The broadcast propagation protocol: lets independent execution contexts
//! arranged in a tree share application notifications as if they were a
//! single event bus, despite each context owning an isolated event space.
//!
//! ## Propagation
//!
//! ```text
//! broadcast("ns:event", data)          relay to parent + children
//!        │                                       │
//!        ▼                                       ▼
//! [BroadcastService] ──envelope──→ transport ──→ [receiving context]
//!        ▲                                       │
//!        └────────── re-entrant broadcast ◀──────┘
//! ```
//!
//! Every receiving context unwraps the envelope and re-invokes the same
//! broadcast pipeline, which fires the notification locally (subject to
//! targeting) and continues the relay outward. Per-context dedup caches
//! recognize each context's own prior relay coming back around the tree
//! and suppress it, which is what bounds the recursion.

pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use domain::{BroadcastOptions, BroadcastOutcome, CipherError, ProtocolConfig, RelayDedupCache};
pub use events::{BroadcastError, TransportError};
pub use ports::{BroadcastApi, EventDispatcher, InboundMessageHandler, RelayTransport, TreeTopology};
pub use service::BroadcastService;
