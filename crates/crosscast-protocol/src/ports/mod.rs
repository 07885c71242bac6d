//! Ports for the broadcast protocol, split hexagonally: inbound traits are
//! the protocol's API, outbound traits are the collaborators the hosting
//! environment supplies.

pub mod inbound;
pub mod outbound;

pub use inbound::{BroadcastApi, InboundMessageHandler};
pub use outbound::{EventDispatcher, RelayTransport, TreeTopology};
