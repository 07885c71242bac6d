//! # Propagation Flow Tests
//!
//! Tree-wide fan-out through the simulated transport: every context fires
//! exactly once per broadcast regardless of where it originated, the relay
//! recursion terminates within the edge bound, and envelope fields survive
//! multi-hop transit unchanged.

#[cfg(test)]
mod tests {
    use crate::init_tracing;
    use crate::integration::fixtures::ThreeHopChain;
    use crosscast_bus::EventFilter;
    use crosscast_protocol::{BroadcastApi, BroadcastOptions, InboundMessageHandler};
    use crosscast_sim::{SimNode, SimTree};
    use crosscast_types::{ORIGIN_KEY, WIRE_KEY};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// root ── child_a ── grandchild
    ///     └── child_b
    fn diamond_tree() -> (SimTree, SimNode, SimNode, SimNode, SimNode) {
        let mut tree = SimTree::new();
        let root = tree.add_root("page:root");
        let child_a = tree.add_child(root.id, "page:child-a");
        let child_b = tree.add_child(root.id, "page:child-b");
        let grandchild = tree.add_child(child_a.id, "page:grandchild");
        (tree, root, child_a, child_b, grandchild)
    }

    #[test]
    fn test_leaf_broadcast_fires_once_at_every_context() {
        init_tracing();
        let (tree, root, child_a, child_b, grandchild) = diamond_tree();

        let mut subs: Vec<_> = [&root, &child_a, &child_b, &grandchild]
            .iter()
            .map(|n| n.bus.subscribe(EventFilter::all()))
            .collect();

        // Initiate at the leaf: the broadcast must climb to the root and
        // fan back down to the sibling subtree.
        grandchild
            .service
            .broadcast("cart:updated", Some(json!({"count": 2})), BroadcastOptions::default())
            .unwrap();
        tree.run_until_idle();

        for sub in &mut subs {
            let events = sub.drain();
            assert_eq!(events.len(), 1, "each context fires exactly once");
            assert_eq!(events[0].name, "cart:updated");
            assert_eq!(events[0].detail["count"], 2);
        }
    }

    #[test]
    fn test_interior_broadcast_fires_once_at_every_context() {
        let (tree, root, child_a, child_b, grandchild) = diamond_tree();

        let mut subs: Vec<_> = [&root, &child_a, &child_b, &grandchild]
            .iter()
            .map(|n| n.bus.subscribe(EventFilter::all()))
            .collect();

        child_a
            .service
            .broadcast("ns:ping", None, BroadcastOptions::default())
            .unwrap();
        tree.run_until_idle();

        for sub in &mut subs {
            assert_eq!(sub.drain().len(), 1);
        }
    }

    #[test]
    fn test_propagation_terminates_within_edge_bound() {
        let (tree, root, _child_a, _child_b, _grandchild) = diamond_tree();

        root.service
            .broadcast("ns:ping", None, BroadcastOptions::default())
            .unwrap();
        let delivered = tree.run_until_idle();

        // Each context relays at most once to each neighbor, so total
        // deliveries are bounded by twice the edge count.
        assert!(delivered <= 2 * tree.edge_count());
        assert!(delivered > 0);
    }

    #[test]
    fn test_deep_chain_converges() {
        let mut tree = SimTree::new();
        let root = tree.add_root("chain:0");
        let mut tail = root.clone();
        for depth in 1..=5 {
            tail = tree.add_child(tail.id, &format!("chain:{depth}"));
        }

        let mut tail_sub = tail.bus.subscribe(EventFilter::all());
        let mut root_sub = root.bus.subscribe(EventFilter::all());

        root.service
            .broadcast("ns:deep", None, BroadcastOptions::default())
            .unwrap();
        let delivered = tree.run_until_idle();

        assert_eq!(root_sub.drain().len(), 1);
        assert_eq!(tail_sub.drain().len(), 1);
        assert!(delivered <= 2 * tree.edge_count());
    }

    #[test]
    fn test_independent_broadcasts_each_fire_once() {
        let (tree, root, _child_a, child_b, grandchild) = diamond_tree();

        let mut sub = child_b.bus.subscribe(EventFilter::all());

        root.service
            .broadcast("ns:first", None, BroadcastOptions::default())
            .unwrap();
        tree.run_until_idle();
        grandchild
            .service
            .broadcast("ns:second", None, BroadcastOptions::default())
            .unwrap();
        tree.run_until_idle();

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "ns:first");
        assert_eq!(events[1].name, "ns:second");
    }

    #[test]
    fn test_envelope_fields_across_three_hops() {
        let chain = ThreeHopChain::new();
        let root_origin = chain.root.service.origin_id().clone();

        // Hop 1: the root originates.
        chain
            .root
            .service
            .broadcast("ns:journey", Some(json!({"step": 0})), BroadcastOptions::default())
            .unwrap();
        let sent = chain.root.transport.take();
        assert_eq!(sent.len(), 1);
        let to_child = sent.into_iter().next().unwrap().1;
        assert_eq!(
            to_child[WIRE_KEY]["broadcastIds"].as_array().unwrap().len(),
            1
        );

        // Hop 2: the child relays up and down; take the downward copy.
        chain.child.service.handle_message(chain.root.id, &to_child);
        let sent = chain.child.transport.take();
        assert_eq!(sent.len(), 2, "interior hop relays in both directions");
        let to_grandchild = sent
            .into_iter()
            .find(|(target, _)| *target == chain.grandchild.id)
            .expect("copy addressed to the grandchild")
            .1;
        assert_eq!(
            to_grandchild[WIRE_KEY]["broadcastIds"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            to_grandchild[WIRE_KEY]["originId"],
            root_origin.as_str(),
            "relay hops never rewrite the origin"
        );

        // Hop 3: the grandchild fires with the original identity intact.
        chain
            .grandchild
            .service
            .handle_message(chain.child.id, &to_grandchild);
        let fired = chain.grandchild.dispatcher.fired.lock();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1[ORIGIN_KEY], root_origin.as_str());

        // And its own forward appended a third token.
        let sent = chain.grandchild.transport.take();
        let back_up = &sent[0].1;
        assert_eq!(
            back_up[WIRE_KEY]["broadcastIds"].as_array().unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_async_subscriber_sees_relayed_broadcast() {
        let (tree, root, _child_a, _child_b, grandchild) = diamond_tree();

        let mut sub = grandchild.bus.subscribe(EventFilter::name("ns:async"));

        root.service
            .broadcast("ns:async", Some(json!({"ok": true})), BroadcastOptions::default())
            .unwrap();
        tree.run_until_idle();

        let event = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(event.detail["ok"], true);
    }
}
