//! # Broadcast Service
//!
//! The per-context protocol engine. One instance lives in each context and
//! implements both inbound ports:
//!
//! - [`BroadcastApi`]: the public entry point for originating a broadcast
//! - [`InboundMessageHandler`]: the transport delivery hook that unwraps a
//!   relayed envelope and re-enters the same pipeline
//!
//! The re-entrant call is the entire fan-out mechanism: every receiving
//! context fires locally (subject to targeting) and relays onward to its
//! own parent and children, without any node knowing the whole tree shape.
//! The dedup cache is what stops that recursion from cycling forever.
//!
//! It depends on three outbound ports supplied by the hosting environment:
//! [`EventDispatcher`], [`TreeTopology`], and [`RelayTransport`].

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::domain::{cipher, BroadcastOptions, BroadcastOutcome, ProtocolConfig, RelayDedupCache};
use crate::events::BroadcastError;
use crate::ports::inbound::{BroadcastApi, InboundMessageHandler};
use crate::ports::outbound::{EventDispatcher, RelayTransport, TreeTopology};
use crosscast_types::{
    envelope, hash36, BroadcastEnvelope, ContextId, Detail, OriginId, ORIGIN_KEY, TARGET_KEY,
};

/// Everything a relay hop carries into the re-entrant pipeline besides the
/// event name and payload.
#[derive(Debug, Default)]
struct RelayFrame {
    /// Dedup tokens appended by prior hops.
    carried_ids: Vec<String>,
    /// Origin identity from the inbound envelope, when re-entering.
    origin: Option<OriginId>,
    /// Target restriction, from options or the inbound envelope.
    target: Option<OriginId>,
    /// Seal the payload before relaying onward.
    sealed: bool,
    /// Per-broadcast diagnostics flag.
    debug: bool,
}

/// Per-context broadcast protocol engine.
///
/// ## Thread Safety
///
/// Shareable across tasks via `Arc`; the dedup cache sits behind an
/// `RwLock`. Within one context the protocol is cooperative — `broadcast`
/// and `handle_message` never run concurrently with themselves — so the
/// lock is uncontended by construction.
pub struct BroadcastService<D, T, R>
where
    D: EventDispatcher,
    T: TreeTopology,
    R: RelayTransport,
{
    /// Process-local handle for this context's endpoint.
    context_id: ContextId,
    /// Identity minted once at initialization, immutable afterwards.
    origin: OriginId,
    /// Loop-suppression cache of tokens this context minted.
    dedup: RwLock<RelayDedupCache>,
    /// Local event facility adapter.
    dispatcher: Arc<D>,
    /// Tree position adapter.
    topology: Arc<T>,
    /// Isolation-boundary message channel adapter.
    transport: Arc<R>,
}

impl<D, T, R> BroadcastService<D, T, R>
where
    D: EventDispatcher,
    T: TreeTopology,
    R: RelayTransport,
{
    /// Initialize the protocol for one context.
    ///
    /// Mints the context's origin identity; this runs once per context
    /// lifetime.
    pub fn new(
        config: ProtocolConfig,
        context_id: ContextId,
        dispatcher: Arc<D>,
        topology: Arc<T>,
        transport: Arc<R>,
    ) -> Self {
        Self {
            context_id,
            origin: OriginId::mint(&config.location),
            dedup: RwLock::new(RelayDedupCache::with_ttl(config.dedup_ttl)),
            dispatcher,
            topology,
            transport,
        }
    }

    /// This context's endpoint handle.
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Mint a dedup token for one forwarding of the named event.
    ///
    /// Inputs include a high-resolution timestamp and a random draw, so the
    /// hash input is never repeated.
    fn mint_token(&self, name: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let draw: u64 = rand::random();
        hash36(&format!("{}|{name}|{nanos}|{draw}", self.origin))
    }

    /// The shared pipeline behind both the public entry point and the
    /// inbound handler's re-entrant call.
    fn propagate(
        &self,
        name: &str,
        mut detail: Map<String, Value>,
        frame: RelayFrame,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        // Stamp the origin, first write wins: a relayed payload keeps the
        // original sender's identity through every hop.
        if !detail.contains_key(ORIGIN_KEY) {
            let stamp = frame.origin.as_ref().unwrap_or(&self.origin);
            detail.insert(ORIGIN_KEY.to_string(), Value::String(stamp.to_string()));
        }
        let origin = detail
            .get(ORIGIN_KEY)
            .and_then(Value::as_str)
            .map(OriginId::from)
            .unwrap_or_else(|| self.origin.clone());

        // Same rule for the target: a relay cannot override an in-flight one.
        if let Some(target) = &frame.target {
            if !detail.contains_key(TARGET_KEY) {
                detail.insert(TARGET_KEY.to_string(), Value::String(target.to_string()));
            }
        }
        let target = detail
            .get(TARGET_KEY)
            .and_then(Value::as_str)
            .map(OriginId::from);

        // The cipher key is the origin identity; without it, sealing is
        // impossible and the call must fail before anything observable.
        if frame.sealed && origin.is_empty() {
            return Err(BroadcastError::MissingCipherKey);
        }

        // Loop suppression: tokens minted by other hops against the set
        // this context minted itself.
        let token = {
            let mut dedup = self.dedup.write();
            if dedup.suppresses(&frame.carried_ids) {
                if frame.debug {
                    debug!(event = name, "Broadcast suppressed as a relay echo");
                }
                return Ok(BroadcastOutcome::suppressed());
            }
            let token = self.mint_token(name);
            dedup.record(token.clone());
            token
        };
        let mut broadcast_ids = frame.carried_ids;
        broadcast_ids.push(token.clone());

        // Local fire, gated by targeting only. Always plaintext.
        let fired_locally = target.as_ref().map_or(true, |t| *t == self.origin);
        if fired_locally {
            let listeners = self.dispatcher.dispatch(name, &Value::Object(detail.clone()));
            if frame.debug {
                debug!(event = name, listeners, "Broadcast fired locally");
            }
        } else if frame.debug {
            debug!(event = name, "Broadcast not for this context; relaying only");
        }

        // Seal for transit after the local fire.
        let wire_detail = if frame.sealed {
            let sealed = cipher::seal_object(&detail, origin.as_str())
                .map_err(|_| BroadcastError::MissingCipherKey)?;
            Detail::Sealed(sealed)
        } else {
            Detail::Plain(detail)
        };

        let raw = BroadcastEnvelope {
            event_type: name.to_string(),
            detail: wire_detail,
            origin_id: origin,
            target_id: target,
            broadcast_ids,
            debug: frame.debug,
        }
        .into_wire()
        .to_raw();

        // Fan out to the parent and every child; a failed send skips that
        // one target and the rest still go out.
        let mut targets: Vec<ContextId> = Vec::new();
        if let Some(parent) = self.topology.parent() {
            targets.push(parent);
        }
        targets.extend(self.topology.children());

        let mut relays_attempted = 0;
        let mut relays_failed = 0;
        for relay_target in targets {
            if relay_target == self.context_id {
                continue;
            }
            relays_attempted += 1;
            if let Err(error) = self.transport.send(&relay_target, raw.clone()) {
                relays_failed += 1;
                warn!(
                    event = name,
                    target = %relay_target,
                    error = %error,
                    "Relay send failed; continuing fan-out"
                );
            }
        }
        if frame.debug {
            debug!(
                event = name,
                relays_attempted, relays_failed, "Broadcast relayed"
            );
        }

        Ok(BroadcastOutcome {
            broadcast_id: Some(token),
            suppressed: false,
            fired_locally,
            relays_attempted,
            relays_failed,
        })
    }
}

impl<D, T, R> BroadcastApi for BroadcastService<D, T, R>
where
    D: EventDispatcher,
    T: TreeTopology,
    R: RelayTransport,
{
    fn broadcast(
        &self,
        name: &str,
        data: Option<Value>,
        options: BroadcastOptions,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        if !envelope::has_namespace(name) {
            return Err(BroadcastError::InvalidEventName {
                name: name.to_string(),
            });
        }

        let detail = match data {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(BroadcastError::InvalidPayload),
        };

        self.propagate(
            name,
            detail,
            RelayFrame {
                carried_ids: Vec::new(),
                origin: None,
                target: options.target,
                sealed: options.encrypt,
                debug: options.debug,
            },
        )
    }

    fn origin_id(&self) -> &OriginId {
        &self.origin
    }
}

impl<D, T, R> InboundMessageHandler for BroadcastService<D, T, R>
where
    D: EventDispatcher,
    T: TreeTopology,
    R: RelayTransport,
{
    fn handle_message(&self, sender: ContextId, raw: &Value) {
        // Defense in depth beyond the dedup cache.
        if sender == self.context_id {
            return;
        }

        // Anything that is not a well-formed broadcast is unrelated traffic.
        let Some(envelope) = envelope::unwrap_wire(raw) else {
            return;
        };

        let was_sealed = envelope.detail.is_sealed();
        let detail = match envelope.detail {
            Detail::Plain(map) => map,
            Detail::Sealed(sealed) => match cipher::open_object(&sealed) {
                Ok(map) => map,
                Err(error) => {
                    // Degrade to a dataless broadcast rather than dropping
                    // or crashing.
                    warn!(
                        event = %envelope.event_type,
                        error = %error,
                        "Failed to open sealed detail; continuing with empty payload"
                    );
                    Map::new()
                }
            },
        };

        // Re-enter the pipeline: fire locally (subject to targeting) and
        // continue the relay outward from this node.
        let result = self.propagate(
            &envelope.event_type,
            detail,
            RelayFrame {
                carried_ids: envelope.broadcast_ids,
                origin: Some(envelope.origin_id),
                target: envelope.target_id,
                sealed: was_sealed,
                debug: envelope.debug,
            },
        );
        if let Err(error) = result {
            warn!(error = %error, "Inbound broadcast could not be re-relayed");
        }
    }
}
