//! Process-wide counters for the serial pipeline. Cheap relaxed atomics;
//! read via [`snapshot`] for status display and tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static FRAMES_DECODED: AtomicU64 = AtomicU64::new(0);
static FRAMES_RESYNCED: AtomicU64 = AtomicU64::new(0);
static DECODE_ERRORS: AtomicU64 = AtomicU64::new(0);
static MESSAGES_SENT: AtomicU64 = AtomicU64::new(0);
static MESSAGES_ACKED: AtomicU64 = AtomicU64::new(0);
static MESSAGES_FAILED: AtomicU64 = AtomicU64::new(0);
static ACK_LATENCY_SUM_MS: AtomicU64 = AtomicU64::new(0);
static ACK_LATENCY_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn inc_frames_decoded() {
    FRAMES_DECODED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_frames_resynced() {
    FRAMES_RESYNCED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_decode_errors() {
    DECODE_ERRORS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_messages_sent() {
    MESSAGES_SENT.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_messages_acked() {
    MESSAGES_ACKED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_messages_failed() {
    MESSAGES_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn observe_ack_latency(sent_at: Instant) {
    let ms = sent_at.elapsed().as_millis() as u64;
    ACK_LATENCY_SUM_MS.fetch_add(ms, Ordering::Relaxed);
    ACK_LATENCY_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub frames_decoded: u64,
    pub frames_resynced: u64,
    pub decode_errors: u64,
    pub messages_sent: u64,
    pub messages_acked: u64,
    pub messages_failed: u64,
    pub ack_latency_avg_ms: Option<u64>,
}

pub fn snapshot() -> Snapshot {
    let sum = ACK_LATENCY_SUM_MS.load(Ordering::Relaxed);
    let count = ACK_LATENCY_COUNT.load(Ordering::Relaxed);
    Snapshot {
        frames_decoded: FRAMES_DECODED.load(Ordering::Relaxed),
        frames_resynced: FRAMES_RESYNCED.load(Ordering::Relaxed),
        decode_errors: DECODE_ERRORS.load(Ordering::Relaxed),
        messages_sent: MESSAGES_SENT.load(Ordering::Relaxed),
        messages_acked: MESSAGES_ACKED.load(Ordering::Relaxed),
        messages_failed: MESSAGES_FAILED.load(Ordering::Relaxed),
        ack_latency_avg_ms: if count > 0 { Some(sum / count) } else { None },
    }
}
