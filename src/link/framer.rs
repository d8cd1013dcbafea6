//! Length-prefixed framing for the wired serial link.
//!
//! Binary messages on the serial link are emitted as:
//!
//!   `0x94 0xC3 <len_hi> <len_lo> <protobuf bytes>`
//!
//! with the two length bytes forming a big-endian 16-bit payload length.
//! [`FrameDecoder`] is an incremental byte-at-a-time state machine that can
//! be fed arbitrary chunks and yields whole frames when available. Malformed
//! headers (bad sync, zero or oversize length) drop the in-progress frame and
//! resynchronize on the next sync byte; nothing here is fatal to the stream.

use log::debug;

use crate::metrics;
use crate::proto::MAX_FRAME_PAYLOAD;

/// First sync byte of every frame header.
pub const SYNC1: u8 = 0x94;
/// Second sync byte of every frame header.
pub const SYNC2: u8 = 0xC3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitSync1,
    WaitSync2,
    WaitLenHigh,
    WaitLenLow,
    ReadingPayload,
}

/// Incremental frame decoder. Partial frames are buffered across `push`
/// calls, so input chunking never affects the frames produced.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    len_high: u8,
    want: usize,
    payload: Vec<u8>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::WaitSync1,
            len_high: 0,
            want: 0,
            payload: Vec::with_capacity(256),
        }
    }

    /// Feed a chunk of raw bytes, returning every frame completed by it.
    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &b in data {
            if let Some(frame) = self.push_byte(b) {
                frames.push(frame);
            }
        }
        frames
    }

    fn push_byte(&mut self, b: u8) -> Option<Vec<u8>> {
        match self.state {
            State::WaitSync1 => {
                if b == SYNC1 {
                    self.state = State::WaitSync2;
                }
            }
            State::WaitSync2 => {
                if b == SYNC2 {
                    self.state = State::WaitLenHigh;
                } else if b == SYNC1 {
                    // A repeated sync1 keeps us one byte from alignment.
                } else {
                    self.state = State::WaitSync1;
                }
            }
            State::WaitLenHigh => {
                self.len_high = b;
                self.state = State::WaitLenLow;
            }
            State::WaitLenLow => {
                let declared = ((self.len_high as usize) << 8) | b as usize;
                if declared == 0 || declared > MAX_FRAME_PAYLOAD {
                    debug!(
                        "frame header with invalid length {} (max {}), resyncing",
                        declared, MAX_FRAME_PAYLOAD
                    );
                    metrics::inc_frames_resynced();
                    self.state = State::WaitSync1;
                } else {
                    self.want = declared;
                    self.payload.clear();
                    self.state = State::ReadingPayload;
                }
            }
            State::ReadingPayload => {
                self.payload.push(b);
                if self.payload.len() == self.want {
                    self.state = State::WaitSync1;
                    metrics::inc_frames_decoded();
                    return Some(std::mem::take(&mut self.payload));
                }
            }
        }
        None
    }

    /// True when no frame is partially buffered.
    pub fn is_idle(&self) -> bool {
        self.state == State::WaitSync1 && self.payload.is_empty()
    }
}

/// Wrap a payload in the wire envelope: sync bytes plus big-endian length.
/// Callers must keep payloads within [`MAX_FRAME_PAYLOAD`]; encode itself
/// never fails for well-formed input.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_FRAME_PAYLOAD);
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.push(SYNC1);
    out.push(SYNC2);
    out.push(((payload.len() >> 8) & 0xFF) as u8);
    out.push((payload.len() & 0xFF) as u8);
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_frame_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        assert!(dec.push(&[0x94, 0xC3, 0x00]).is_empty());
        assert!(dec.push(&[0x05, b'A', b'B']).is_empty());
        let frames = dec.push(&[b'C', b'D', b'E']);
        assert_eq!(frames, vec![b"ABCDE".to_vec()]);
        assert!(dec.is_idle());
    }

    #[test]
    fn repeated_sync1_stays_aligned() {
        // 0x94 0x94 0xC3 ... must still decode: the second 0x94 restarts
        // the sync-2 wait rather than falling back to sync-1.
        let mut dec = FrameDecoder::new();
        let frames = dec.push(&[0x94, 0x94, 0xC3, 0x00, 0x01, 0x7F]);
        assert_eq!(frames, vec![vec![0x7F]]);
    }

    #[test]
    fn zero_and_oversize_lengths_resync() {
        let mut dec = FrameDecoder::new();
        assert!(dec.push(&[0x94, 0xC3, 0x00, 0x00]).is_empty());
        assert!(dec.is_idle());
        assert!(dec.push(&[0x94, 0xC3, 0xFF, 0xFF]).is_empty());
        assert!(dec.is_idle());
        // Stream recovers afterwards.
        let frames = dec.push(&encode_frame(&[1, 2, 3]));
        assert_eq!(frames, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn noise_before_frame_is_skipped() {
        let mut dec = FrameDecoder::new();
        let mut bytes = vec![0x00, 0xC3, 0x42, 0x94, 0x00, 0xFF];
        bytes.extend_from_slice(&encode_frame(b"ok"));
        let frames = dec.push(&bytes);
        assert_eq!(frames, vec![b"ok".to_vec()]);
    }

    #[test]
    fn encode_round_trips_through_decoder() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let wire = encode_frame(&payload);
        assert_eq!(&wire[..4], &[0x94, 0xC3, 0x01, 0x00]);
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.push(&wire), vec![payload]);
    }
}
