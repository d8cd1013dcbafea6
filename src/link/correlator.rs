//! Correlates asynchronous responses against previously issued requests.
//!
//! Two independent flows share this module:
//!
//! 1. **Config handshake** - the client sends want-config with a random
//!    nonzero id, the device streams its node db / config as a burst with no
//!    start marker, then echoes the id in a config-complete packet. Only an
//!    exact id match completes the handshake; mismatches are logged and
//!    ignored. Heartbeat cadence around the handshake belongs to the outer
//!    connection lifecycle, which polls [`RequestCorrelator::config_pending`].
//!
//! 2. **Message delivery status** - every outbound message expecting an
//!    acknowledgement is tracked by packet id. Routing responses move the
//!    status along the `Sending -> Sent -> Delivered` lattice or into a
//!    terminal failure; `Delivered` never regresses on a late duplicate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::time::Instant;

use crate::metrics;
use crate::proto::routing::Error as RoutingError;

use super::packet::{DecodedPacket, NodeId, PacketBody};

/// Delivery state of one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Sending,
    Sent,
    Delivered,
    NoRoute,
    GotNak,
    Timeout,
    MaxRetransmit,
    NoResponse,
    Failed,
}

impl MessageStatus {
    /// Map a nonzero routing reason to its failure variant.
    fn from_failure_reason(reason: i32) -> MessageStatus {
        match RoutingError::try_from(reason) {
            Ok(RoutingError::NoRoute) => MessageStatus::NoRoute,
            Ok(RoutingError::GotNak) => MessageStatus::GotNak,
            Ok(RoutingError::Timeout) => MessageStatus::Timeout,
            Ok(RoutingError::MaxRetransmit) => MessageStatus::MaxRetransmit,
            Ok(RoutingError::NoResponse) => MessageStatus::NoResponse,
            _ => MessageStatus::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            MessageStatus::Sending | MessageStatus::Sent | MessageStatus::Delivered
        )
    }
}

/// One outbound message awaiting delivery confirmation.
#[derive(Debug, Clone)]
pub struct TrackedMessage {
    pub packet_id: u32,
    pub to: NodeId,
    pub channel: u32,
    pub text: String,
    pub status: MessageStatus,
    pub sent_at: DateTime<Utc>,
    sent_instant: Instant,
}

/// Event produced by [`RequestCorrelator::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationEvent {
    /// The outstanding config handshake completed.
    ConfigComplete { config_id: u32 },
    /// A tracked message changed delivery status.
    StatusChanged {
        packet_id: u32,
        status: MessageStatus,
    },
}

#[derive(Debug, Default)]
pub struct RequestCorrelator {
    pending_config: Option<u32>,
    messages: Vec<TrackedMessage>,
    // Positional references into `messages`; rebuilt whenever the list is
    // reordered or reloaded.
    index: HashMap<u32, usize>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Config handshake
    // -----------------------------------------------------------------

    /// Start a config handshake, returning the fresh nonzero id the caller
    /// must send in the want-config command. Replaces any outstanding id.
    pub fn begin_config(&mut self) -> u32 {
        let mut id: u32 = rand::random();
        if id == 0 {
            id = 1;
        }
        debug!("config handshake started, id=0x{:08x}", id);
        self.pending_config = Some(id);
        id
    }

    /// Outstanding handshake id, if one is in flight. While this is `Some`
    /// the caller keeps the fast heartbeat running.
    pub fn config_pending(&self) -> Option<u32> {
        self.pending_config
    }

    // -----------------------------------------------------------------
    // Message status
    // -----------------------------------------------------------------

    /// Begin tracking an outbound message; status starts at `Sending`.
    /// Packet ids are clock-derived and can collide in a burst; re-tracking
    /// an id replaces the stale entry so no orphan lingers in the list.
    pub fn track(&mut self, packet_id: u32, to: NodeId, channel: u32, text: &str) {
        metrics::inc_messages_sent();
        let message = TrackedMessage {
            packet_id,
            to,
            channel,
            text: text.to_string(),
            status: MessageStatus::Sending,
            sent_at: Utc::now(),
            sent_instant: Instant::now(),
        };
        if let Some(&pos) = self.index.get(&packet_id) {
            self.messages[pos] = message;
            return;
        }
        self.messages.push(message);
        self.index.insert(packet_id, self.messages.len() - 1);
    }

    pub fn status(&self, packet_id: u32) -> Option<MessageStatus> {
        self.index
            .get(&packet_id)
            .and_then(|&i| self.messages.get(i))
            .map(|m| m.status)
    }

    pub fn messages(&self) -> &[TrackedMessage] {
        &self.messages
    }

    /// Replace the message list (bulk reload), sort by send time descending,
    /// and rebuild the positional index.
    pub fn replace_messages(&mut self, mut messages: Vec<TrackedMessage>) {
        messages.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        self.messages = messages;
        self.rebuild_index();
    }

    /// Rebuild the packet-id index. Must run after any reorder of the
    /// underlying list since the index stores positions.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| (m.packet_id, i))
            .collect();
    }

    // -----------------------------------------------------------------
    // Inbound fan-in
    // -----------------------------------------------------------------

    /// Feed one decoded packet; returns an event when it resolves an
    /// outstanding request. Packets unrelated to any request return `None`.
    pub fn observe(&mut self, pkt: &DecodedPacket) -> Option<CorrelationEvent> {
        match &pkt.body {
            PacketBody::ConfigComplete { config_id } => self.observe_config_complete(*config_id),
            PacketBody::Routing(status) => {
                self.observe_routing(pkt.correlation_id, pkt.from, status.reason)
            }
            _ => None,
        }
    }

    fn observe_config_complete(&mut self, config_id: u32) -> Option<CorrelationEvent> {
        match self.pending_config {
            Some(expected) if expected == config_id => {
                debug!("config handshake complete, id=0x{:08x}", config_id);
                self.pending_config = None;
                Some(CorrelationEvent::ConfigComplete { config_id })
            }
            Some(expected) => {
                // No retry here; the outstanding request stays armed.
                warn!(
                    "config_complete_id mismatch: got 0x{:08x}, expecting 0x{:08x}",
                    config_id, expected
                );
                None
            }
            None => {
                debug!(
                    "unsolicited config_complete_id 0x{:08x}, ignoring",
                    config_id
                );
                None
            }
        }
    }

    fn observe_routing(
        &mut self,
        packet_id: u32,
        from: NodeId,
        reason: i32,
    ) -> Option<CorrelationEvent> {
        let &pos = self.index.get(&packet_id)?;
        let msg = self.messages.get_mut(pos)?;

        let next = if reason == 0 {
            match msg.status {
                // Monotonic: a late duplicate ack never regresses Delivered.
                MessageStatus::Delivered => return None,
                MessageStatus::Sending | MessageStatus::Sent if from == msg.to => {
                    // Ack from the true destination, not an intermediate relay.
                    MessageStatus::Delivered
                }
                _ => MessageStatus::Sent,
            }
        } else {
            if msg.status == MessageStatus::Delivered {
                debug!(
                    "routing error {} for already-delivered id={}, ignoring",
                    reason, packet_id
                );
                return None;
            }
            MessageStatus::from_failure_reason(reason)
        };

        if next == msg.status {
            return None;
        }
        msg.status = next;
        match next {
            MessageStatus::Delivered => {
                metrics::inc_messages_acked();
                metrics::observe_ack_latency(msg.sent_instant);
            }
            s if s.is_failure() => metrics::inc_messages_failed(),
            _ => {}
        }
        debug!(
            "message id={} to=0x{:08x} status -> {:?}",
            packet_id, msg.to, next
        );
        Some(CorrelationEvent::StatusChanged {
            packet_id,
            status: next,
        })
    }
}
