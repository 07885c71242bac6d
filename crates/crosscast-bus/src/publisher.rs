//! # Event Publisher
//!
//! The dispatching side of the local bus.

use crate::event::{BusEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Returns the number of active subscribers that received the event.
    async fn publish(&self, event: BusEvent) -> usize;

    /// Total events dispatched since creation.
    fn events_dispatched(&self) -> u64;
}

/// In-memory local event bus for one context.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Dispatch itself is synchronous — publishing never waits on
/// subscribers — which is what lets the propagation protocol fire
/// notifications from a non-async call path.
pub struct LocalBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<BusEvent>,

    /// Active subscription count by filter key.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events dispatched.
    dispatched: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl LocalBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            dispatched: AtomicU64::new(0),
            capacity,
        }
    }

    /// Fire a notification to local subscribers.
    ///
    /// Returns the number of subscribers that received it; an event with no
    /// subscribers is dropped, which is not an error.
    pub fn dispatch(&self, name: &str, detail: &Value) -> usize {
        self.dispatched.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(BusEvent::new(name, detail.clone())) {
            Ok(receiver_count) => {
                debug!(event = name, receivers = receiver_count, "Event dispatched");
                receiver_count
            }
            Err(error) => {
                warn!(event = name, error = %error, "Event dropped (no receivers)");
                0
            }
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let filter_key = format!("{:?}|{:?}", filter.names, filter.namespaces);

        // Track subscription
        {
            if let Ok(mut subs) = self.subscriptions.write() {
                *subs.entry(filter_key.clone()).or_insert(0) += 1;
            }
        }

        debug!(names = ?filter.names, namespaces = ?filter.namespaces, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), filter_key)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// The channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for LocalBus {
    async fn publish(&self, event: BusEvent) -> usize {
        self.dispatch(&event.name, &event.detail)
    }

    fn events_dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}
