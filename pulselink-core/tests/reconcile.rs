//! Bind reconciliation: newly bound endpoints are brought up to the current
//! strength targets after the settle delay, and only they are touched.

mod common;

use common::Harness;
use pulselink_net::OutboundMessage;
use pulselink_types::{Channel, EndpointId};

#[test]
fn new_bind_receives_both_strength_targets() {
    let harness = Harness::new();
    harness.engine.initialize();
    let first = harness.connect_and_bind("app-1");
    harness.quiesce();

    // Establish non-zero targets, then drain the pushes that set them.
    harness.engine.set_strength(Channel::A, 40);
    harness.engine.set_strength(Channel::B, 60);
    harness.transport.take_log();

    let second = harness.connect_and_bind("app-2");
    common::settle_and_margin();

    // Exactly two strength commands, one per channel, to the new endpoint.
    // The channel pushes run concurrently, so order is not fixed.
    let records = harness.transport.records_for(&second);
    assert_eq!(records.len(), 2);
    let mut values: Vec<(Channel, u8)> = records
        .iter()
        .map(|r| match &r.message {
            OutboundMessage::SetStrength { channel, value } => (*channel, *value),
            other => panic!("expected strength command, got {:?}", other),
        })
        .collect();
    values.sort_by_key(|(channel, _)| channel.code());
    assert_eq!(values, vec![(Channel::A, 40), (Channel::B, 60)]);

    // The endpoint that was already bound is left alone.
    assert!(harness.transport.records_for(&first).is_empty());
}

#[test]
fn reconcile_waits_for_the_settle_delay() {
    let harness = Harness::new();
    harness.engine.initialize();

    harness.connect_and_bind("app-1");
    // Immediately after the bind event nothing has been pushed yet.
    std::thread::sleep(common::SETTLE / 5);
    assert!(harness.transport.log().is_empty());

    common::settle_and_margin();
    assert_eq!(harness.transport.log().len(), 2);
}

#[test]
fn bound_but_unconnected_endpoint_is_skipped() {
    let harness = Harness::new();
    harness.engine.initialize();

    // Bind event without a transport-level connection.
    harness
        .transport
        .bind(&harness.controller, EndpointId::new("ghost"));
    common::settle_and_margin();

    assert!(harness.transport.log().is_empty());
}

#[test]
fn unbind_events_are_ignored() {
    let harness = Harness::new();
    harness.engine.initialize();
    let app = harness.connect_and_bind("app-1");
    harness.quiesce();

    harness.transport.unbind(&harness.controller, &app);
    common::settle_and_margin();

    assert!(harness.transport.log().is_empty());
}

#[test]
fn dispose_stops_the_listener() {
    let harness = Harness::new();
    harness.engine.initialize();
    harness.engine.dispose();

    harness.connect_and_bind("app-1");
    common::settle_and_margin();

    assert!(harness.transport.log().is_empty());
}

#[test]
fn reconcile_failure_is_swallowed() {
    let harness = Harness::new();
    harness.engine.initialize();
    let broken = EndpointId::new("broken");
    harness.transport.connect(broken.clone());
    harness.transport.sever(broken.clone());
    harness.transport.bind(&harness.controller, broken.clone());
    common::settle_and_margin();

    // Both pushes were attempted and failed; the listener is still alive
    // and reconciles the next bind normally.
    assert_eq!(harness.transport.records_for(&broken).len(), 2);
    harness.transport.take_log();

    let healthy = harness.connect_and_bind("app-1");
    common::settle_and_margin();
    assert_eq!(harness.transport.records_for(&healthy).len(), 2);
}
