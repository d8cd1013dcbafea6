//! Serial-link protocol handling: framing, packet codec, and
//! request/response correlation.
//!
//! Inbound data flows `bytes -> FrameDecoder -> PacketCodec::decode ->
//! DecodedPacket`, which fans out to the node store (entity merge) and the
//! correlator (handshake / delivery status). Outbound commands are built by
//! [`codec::PacketCodec`] and wrapped in the same frame envelope. Everything
//! here runs synchronously on the caller's thread; nothing blocks or
//! suspends, and no failure path terminates the stream.

pub mod codec;
pub mod correlator;
pub mod framer;
pub mod packet;

pub use codec::{DecodeError, PacketCodec};
pub use correlator::{CorrelationEvent, MessageStatus, RequestCorrelator, TrackedMessage};
pub use framer::{encode_frame, FrameDecoder};
pub use packet::{DecodedPacket, NodeId, PacketBody, PacketKind, BROADCAST_ADDR};
