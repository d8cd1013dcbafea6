//! Node store merge semantics: updates are additive and never erase fields
//! the incoming observation does not carry.

mod common;

use std::sync::Arc;

use meshlink::link::PacketCodec;
use meshlink::nodes::{persist::NullPersistence, NodeStore};

const NODE: u32 = 0x0A0B0C0D;

fn store() -> NodeStore {
    NodeStore::new(Arc::new(NullPersistence))
}

fn apply(store: &NodeStore, codec: &PacketCodec, frame: Vec<u8>) {
    let pkt = codec.decode(&frame).expect("decode");
    store.apply_packet(&pkt);
}

#[tokio::test]
async fn telemetry_update_leaves_position_intact() {
    let codec = PacketCodec::new();
    let store = store();

    apply(&store, &codec, common::position_frame(NODE, 407_128_000, -740_060_000, 25));
    let before = store.get(NODE).unwrap();
    assert!(before.has_position);

    apply(&store, &codec, common::device_telemetry_frame(NODE, 75, 3.8));

    let after = store.get(NODE).unwrap();
    assert_eq!(after.battery_level, Some(75));
    // Position survives untouched.
    assert!(after.has_position);
    assert_eq!(after.latitude, before.latitude);
    assert_eq!(after.longitude, before.longitude);
    assert_eq!(after.altitude, 25);
}

#[tokio::test]
async fn text_traffic_only_bumps_last_heard() {
    let codec = PacketCodec::new();
    let store = store();

    apply(&store, &codec, common::device_telemetry_frame(NODE, 50, 3.6));
    let before = store.get(NODE).unwrap();

    apply(&store, &codec, common::text_frame(NODE, 0xFFFF_FFFF, 0, "hello"));

    let after = store.get(NODE).unwrap();
    assert_eq!(after.battery_level, before.battery_level);
    assert_eq!(after.voltage, before.voltage);
    assert!(after.last_heard >= before.last_heard);
}

#[tokio::test]
async fn battery_over_hundred_means_external_power() {
    let codec = PacketCodec::new();
    let store = store();

    apply(&store, &codec, common::device_telemetry_frame(NODE, 101, 4.9));
    let e = store.get(NODE).unwrap();
    assert!(e.external_power);
    assert_eq!(e.battery_level, Some(100));

    apply(&store, &codec, common::device_telemetry_frame(NODE, 64, 3.7));
    let e = store.get(NODE).unwrap();
    assert!(!e.external_power);
    assert_eq!(e.battery_level, Some(64));
}

#[tokio::test]
async fn packets_without_a_source_are_ignored() {
    let codec = PacketCodec::new();
    let store = store();

    // A broadcast source address identifies no node.
    apply(&store, &codec, common::text_frame(0xFFFF_FFFF, NODE, 0, "noise"));
    apply(&store, &codec, common::text_frame(0, NODE, 0, "noise"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn direct_updates_merge_like_packets() {
    let store = store();

    let user = meshlink::proto::User {
        long_name: "Base Camp".into(),
        short_name: "BC".into(),
        ..Default::default()
    };
    store.update_user(NODE, &user);
    store.update_signal(NODE, Some(4.5), Some(-70), Some(2));
    store.set_favorite(NODE, true);

    let e = store.get(NODE).unwrap();
    assert_eq!(e.long_name, "Base Camp");
    assert_eq!(e.snr, Some(4.5));
    assert_eq!(e.hops_away, Some(2));
    assert!(e.favorite);
}

#[tokio::test]
async fn get_all_orders_by_recency() {
    let codec = PacketCodec::new();
    let store = store();

    apply(&store, &codec, common::device_telemetry_frame(1, 10, 3.0));
    apply(&store, &codec, common::device_telemetry_frame(2, 20, 3.1));
    apply(&store, &codec, common::device_telemetry_frame(1, 30, 3.2));

    let all = store.get_all();
    assert_eq!(all.len(), 2);
    assert!(all[0].last_heard >= all[1].last_heard);
}
