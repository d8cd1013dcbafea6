//! Store + JSON cache end to end: a session's observations survive a
//! restart through the persistence hook.

mod common;

use std::sync::Arc;

use meshlink::link::PacketCodec;
use meshlink::nodes::persist::JsonNodeCache;
use meshlink::nodes::NodeStore;

#[tokio::test]
async fn nodes_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodes.json");
    let codec = PacketCodec::new();

    {
        let store = NodeStore::new(Arc::new(JsonNodeCache::open(&path)));
        let pkt = codec
            .decode(&common::position_frame(7, 407_128_000, -740_060_000, 12))
            .unwrap();
        store.apply_packet(&pkt);
        let pkt = codec
            .decode(&common::device_telemetry_frame(8, 55, 3.7))
            .unwrap();
        store.apply_packet(&pkt);
    }

    // New session, same cache file.
    let store = NodeStore::new(Arc::new(JsonNodeCache::open(&path)));
    assert!(store.is_empty());
    assert_eq!(store.load_from_persistence().unwrap(), 2);

    let restored = store.get(7).expect("node 7 restored");
    assert!(restored.has_position);
    assert!((restored.latitude - 40.7128).abs() < 1e-6);
    assert_eq!(store.get(8).unwrap().battery_level, Some(55));
}

#[tokio::test]
async fn clear_empties_the_cache_too() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodes.json");
    let codec = PacketCodec::new();

    {
        let store = NodeStore::new(Arc::new(JsonNodeCache::open(&path)));
        let pkt = codec
            .decode(&common::device_telemetry_frame(7, 80, 3.9))
            .unwrap();
        store.apply_packet(&pkt);
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    // Cleared entities must not resurrect on the next session.
    let store = NodeStore::new(Arc::new(JsonNodeCache::open(&path)));
    assert_eq!(store.load_from_persistence().unwrap(), 0);
    assert!(store.is_empty());
}
