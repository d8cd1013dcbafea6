//! # Meshlink - communication core for Meshtastic-style mesh radio clients
//!
//! Meshlink maintains a live model of a radio mesh network by talking to one
//! locally attached mesh-radio device over a byte-oriented serial link. The
//! device speaks a length-framed, protobuf-encoded request/response protocol;
//! this crate handles everything between the raw byte stream and a queryable
//! picture of the mesh:
//!
//! - **Framing**: extracting complete, length-bounded frames from an
//!   unreliable, arbitrarily chunked stream ([`link::framer`])
//! - **Codec**: decoding the tagged-union wire format into typed packets,
//!   including per-port decode of nested payloads, and encoding outbound
//!   commands in the same envelope ([`link::codec`])
//! - **Correlation**: matching the config handshake and per-message delivery
//!   acknowledgements against the continuous inbound stream
//!   ([`link::correlator`])
//! - **Node model**: folding decoded packets into a mergeable, concurrently
//!   readable entity store with debounced change notification and a
//!   pluggable persistence hook ([`nodes`])
//!
//! The GUI, database engine, serial enumeration, and notification layers are
//! external collaborators: they consume this crate through `DecodedPacket`,
//! node-store events, and the persistence trait.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use meshlink::link::{FrameDecoder, PacketCodec, RequestCorrelator};
//! use meshlink::nodes::{persist::NullPersistence, NodeStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut framer = FrameDecoder::new();
//!     let codec = PacketCodec::new();
//!     let mut correlator = RequestCorrelator::new();
//!     let store = NodeStore::new(Arc::new(NullPersistence));
//!
//!     // Bytes from the transport, in any chunking:
//!     let chunk: &[u8] = &[];
//!     for frame in framer.push(chunk) {
//!         match codec.decode(&frame) {
//!             Ok(packet) => {
//!                 store.apply_packet(&packet);
//!                 let _ = correlator.observe(&packet);
//!             }
//!             Err(e) => log::debug!("dropping undecodable frame: {}", e),
//!         }
//!     }
//! }
//! ```
//!
//! ## Module organization
//!
//! - [`link`] - framing, packet codec, request correlation
//! - [`nodes`] - node entity store and persistence hook
//! - [`proto`] - wire-protocol message types (prost)
//! - [`config`] - TOML configuration
//! - [`metrics`] - pipeline counters
//! - [`logutil`] - log sanitization helpers

pub mod config;
pub mod link;
pub mod logutil;
pub mod metrics;
pub mod nodes;
pub mod proto;
