//! Delivery-status and config-handshake correlation against decoded packets.

mod common;

use meshlink::link::{CorrelationEvent, MessageStatus, PacketCodec, RequestCorrelator};

const LOCAL: u32 = 0x0000_0001;
const DEST: u32 = 0x0000_0009;
const RELAY: u32 = 0x0000_0044;

fn observe_routing(
    corr: &mut RequestCorrelator,
    codec: &PacketCodec,
    from: u32,
    request_id: u32,
    reason: i32,
) -> Option<CorrelationEvent> {
    let frame = common::routing_frame(from, request_id, reason);
    let pkt = codec.decode(&frame).expect("decode routing");
    corr.observe(&pkt)
}

#[test]
fn relay_ack_then_destination_ack() {
    let codec = PacketCodec::new();
    let mut corr = RequestCorrelator::new();
    corr.track(100, DEST, 0, "hi");
    assert_eq!(corr.status(100), Some(MessageStatus::Sending));

    // Implicit ack from an intermediate hop: sent, not delivered.
    let ev = observe_routing(&mut corr, &codec, RELAY, 100, 0);
    assert_eq!(
        ev,
        Some(CorrelationEvent::StatusChanged {
            packet_id: 100,
            status: MessageStatus::Sent,
        })
    );

    // Ack from the destination itself.
    let ev = observe_routing(&mut corr, &codec, DEST, 100, 0);
    assert_eq!(
        ev,
        Some(CorrelationEvent::StatusChanged {
            packet_id: 100,
            status: MessageStatus::Delivered,
        })
    );
}

#[test]
fn delivered_never_regresses() {
    let codec = PacketCodec::new();
    let mut corr = RequestCorrelator::new();
    corr.track(200, DEST, 0, "hi");

    assert!(observe_routing(&mut corr, &codec, DEST, 200, 0).is_some());
    assert_eq!(corr.status(200), Some(MessageStatus::Delivered));

    // Late duplicate ack and a straggling error both arrive after delivery.
    assert!(observe_routing(&mut corr, &codec, RELAY, 200, 0).is_none());
    assert!(observe_routing(&mut corr, &codec, RELAY, 200, 3).is_none());
    assert_eq!(corr.status(200), Some(MessageStatus::Delivered));
}

#[test]
fn failure_reason_is_terminal() {
    let codec = PacketCodec::new();
    let mut corr = RequestCorrelator::new();
    corr.track(300, DEST, 0, "hi");

    let ev = observe_routing(&mut corr, &codec, RELAY, 300, 5);
    assert_eq!(
        ev,
        Some(CorrelationEvent::StatusChanged {
            packet_id: 300,
            status: MessageStatus::MaxRetransmit,
        })
    );
    assert!(corr.status(300).unwrap().is_failure());
}

#[test]
fn routing_for_unknown_id_is_ignored() {
    let codec = PacketCodec::new();
    let mut corr = RequestCorrelator::new();
    corr.track(400, DEST, 0, "hi");

    assert!(observe_routing(&mut corr, &codec, DEST, 999, 0).is_none());
    assert_eq!(corr.status(400), Some(MessageStatus::Sending));
}

#[test]
fn config_handshake_requires_exact_id() {
    let codec = PacketCodec::new();
    let mut corr = RequestCorrelator::new();
    let id = corr.begin_config();
    assert_eq!(corr.config_pending(), Some(id));

    // Stale completion from a previous session: logged and ignored, the
    // handshake stays armed.
    let stale = codec
        .decode(&common::config_complete_frame(id.wrapping_add(1)))
        .unwrap();
    assert!(corr.observe(&stale).is_none());
    assert_eq!(corr.config_pending(), Some(id));

    let done = codec.decode(&common::config_complete_frame(id)).unwrap();
    assert_eq!(
        corr.observe(&done),
        Some(CorrelationEvent::ConfigComplete { config_id: id })
    );
    assert_eq!(corr.config_pending(), None);

    // Once resolved, a repeat echo is unsolicited.
    let dup = codec.decode(&common::config_complete_frame(id)).unwrap();
    assert!(corr.observe(&dup).is_none());
}

#[test]
fn unrelated_traffic_produces_no_events() {
    let codec = PacketCodec::new();
    let mut corr = RequestCorrelator::new();
    corr.track(500, DEST, 0, "hi");

    let text = codec.decode(&common::text_frame(DEST, LOCAL, 0, "reply")).unwrap();
    assert!(corr.observe(&text).is_none());
    let pos = codec
        .decode(&common::position_frame(DEST, 1, 2, 3))
        .unwrap();
    assert!(corr.observe(&pos).is_none());
    assert_eq!(corr.status(500), Some(MessageStatus::Sending));
}
