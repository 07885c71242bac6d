//! # Crosscast Bus - Local Event Facility
//!
//! The in-memory notification dispatcher owned by a single context. Many
//! independent listeners can subscribe per event name; a dispatch fires to
//! every matching subscriber. Event names are namespaced (`"ns:event"`)
//! and the namespace separator is first-class.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Protocol /   │                    │  Listener    │
//! │ application  │    dispatch()      │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Local Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! This facility is strictly context-local: it knows nothing about the
//! context tree or relaying. The propagation protocol treats it as an
//! outbound port.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod event;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use event::{BusEvent, EventFilter};
pub use publisher::{EventPublisher, LocalBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lag kicks in.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
