//! Typed representation of one decoded radio->client message.
//!
//! The wire format is a tagged union whose payload shape varies per variant
//! and, for mesh packets, per port number. The primary representation here is
//! the [`PacketBody`] enum of typed payloads; [`DecodedPacket::fields`]
//! additionally projects the body into an ordered key/value list for display
//! and diagnostics, with a raw-hex fallback for ports we do not decode.

use chrono::{DateTime, Utc};

use crate::logutil::hex_snippet;
use crate::proto;

/// 32-bit mesh node identifier.
pub type NodeId = u32;

/// Reserved destination meaning "every node".
pub const BROADCAST_ADDR: NodeId = 0xFFFF_FFFF;

/// `0` in a from/to field means unknown or unset.
pub const NODE_UNSET: NodeId = 0;

/// Which `FromRadio` variant a frame carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    MeshPacket,
    MyNodeInfo,
    NodeInfo,
    Channel,
    Config,
    ModuleConfig,
    QueueStatus,
    Metadata,
    ConfigComplete,
    LogRecord,
    Rebooted,
    Unknown,
}

/// One decoded frame, with link metadata and a typed body.
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    /// Local receive time.
    pub timestamp: DateTime<Utc>,
    pub kind: PacketKind,
    pub from: NodeId,
    pub to: NodeId,
    /// Port number; only meaningful for [`PacketKind::MeshPacket`].
    pub port: Option<proto::PortNum>,
    pub channel: u32,
    /// The packet's own id (0 when the variant carries none).
    pub packet_id: u32,
    /// Id to correlate against outstanding requests. Usually `packet_id`,
    /// but a routing response keys to the original request instead.
    pub correlation_id: u32,
    /// True when the mesh payload arrived channel-encrypted and was kept raw.
    pub encrypted: bool,
    pub snr: Option<f32>,
    pub rssi: Option<i32>,
    /// Relay hops this packet took (hop_start - hop_limit, when known).
    pub hops: Option<u32>,
    pub body: PacketBody,
    /// The complete frame payload as received.
    pub raw: Vec<u8>,
}

/// Typed payload per `(variant, port)` combination.
#[derive(Debug, Clone)]
pub enum PacketBody {
    Text(TextMessage),
    Position(PositionFix),
    User(proto::User),
    Telemetry(TelemetryReading),
    Routing(RoutingStatus),
    Traceroute(TracerouteRecord),
    Admin(AdminResponse),
    /// Signed-but-unhandled port: payload kept raw.
    UnhandledPort { portnum: i32, payload: Vec<u8> },
    /// Encrypted mesh payload, passed through opaque.
    Encrypted { payload: Vec<u8> },
    MyNodeInfo { node_num: NodeId },
    NodeInfo(proto::NodeInfo),
    Channel(proto::Channel),
    Config(ConfigSection),
    ModuleConfig { section: &'static str },
    QueueStatus(proto::QueueStatus),
    Metadata(proto::DeviceMetadata),
    ConfigComplete { config_id: u32 },
    LogRecord(proto::LogRecord),
    Rebooted,
    /// Recognized envelope but no variant we model.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct TextMessage {
    pub text: String,
    /// Nonzero when this message reacts to / replies to another packet.
    pub reply_id: u32,
    pub emoji: bool,
}

/// Position report with wire integers already scaled to degrees.
#[derive(Debug, Clone, Default)]
pub struct PositionFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<i32>,
    pub time: u32,
    pub ground_speed: Option<u32>,
    pub ground_track: Option<u32>,
    pub sats_in_view: u32,
    pub precision_bits: u32,
}

#[derive(Debug, Clone)]
pub enum TelemetryReading {
    Device(proto::DeviceMetrics),
    Environment(proto::EnvironmentMetrics),
    Power(proto::PowerMetrics),
}

#[derive(Debug, Clone)]
pub struct RoutingStatus {
    /// Raw reason code per `routing::Error`; 0 means delivered ok.
    pub reason: i32,
}

/// Traceroute result with SNR recovered in dB (wire stores dB x 4). The
/// receiving packet's own SNR is prepended as an implicit first hop.
#[derive(Debug, Clone, Default)]
pub struct TracerouteRecord {
    pub route: Vec<NodeId>,
    pub snr_towards: Vec<f32>,
    pub route_back: Vec<NodeId>,
    pub snr_back: Vec<f32>,
}

/// Admin response payloads mirror the config-stream decode.
#[derive(Debug, Clone)]
pub enum AdminResponse {
    Config(ConfigSection),
    Channel(proto::Channel),
    Owner(proto::User),
    ModuleConfig { section: &'static str },
    Other,
}

/// One section of device configuration.
#[derive(Debug, Clone)]
pub enum ConfigSection {
    Device(proto::config::DeviceConfig),
    Position(proto::config::PositionConfig),
    Power(proto::config::PowerConfig),
    Network(proto::config::NetworkConfig),
    Display(proto::config::DisplayConfig),
    Lora(proto::config::LoRaConfig),
    Bluetooth(proto::config::BluetoothConfig),
}

impl ConfigSection {
    pub fn name(&self) -> &'static str {
        match self {
            ConfigSection::Device(_) => "device",
            ConfigSection::Position(_) => "position",
            ConfigSection::Power(_) => "power",
            ConfigSection::Network(_) => "network",
            ConfigSection::Display(_) => "display",
            ConfigSection::Lora(_) => "lora",
            ConfigSection::Bluetooth(_) => "bluetooth",
        }
    }
}

/// Value type for the generic field projection.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
    Bool(bool),
    Text(String),
    /// Hex rendering of raw bytes.
    Hex(String),
    List(Vec<FieldValue>),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::U32(v) => write!(f, "{}", v),
            FieldValue::I32(v) => write!(f, "{}", v),
            FieldValue::F32(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Hex(v) => write!(f, "{}", v),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl DecodedPacket {
    /// Ordered key/value projection of the body. Key set depends on the
    /// variant/port; insertion order matches wire/decode order.
    pub fn fields(&self) -> Vec<(String, FieldValue)> {
        let mut out: Vec<(String, FieldValue)> = Vec::new();
        let mut push = |k: &str, v: FieldValue| out.push((k.to_string(), v));

        match &self.body {
            PacketBody::Text(t) => {
                push("text", FieldValue::Text(t.text.clone()));
                if t.reply_id != 0 {
                    push("replyId", FieldValue::U32(t.reply_id));
                }
                if t.emoji {
                    push("emoji", FieldValue::Bool(true));
                }
            }
            PacketBody::Position(p) => {
                if let Some(lat) = p.latitude {
                    push("latitude", FieldValue::F64(lat));
                }
                if let Some(lon) = p.longitude {
                    push("longitude", FieldValue::F64(lon));
                }
                if let Some(alt) = p.altitude {
                    push("altitude", FieldValue::I32(alt));
                }
                if p.time != 0 {
                    push("time", FieldValue::U32(p.time));
                }
                if let Some(v) = p.ground_speed {
                    push("groundSpeed", FieldValue::U32(v));
                }
                if let Some(v) = p.ground_track {
                    push("groundTrack", FieldValue::U32(v));
                }
                if p.sats_in_view != 0 {
                    push("satsInView", FieldValue::U32(p.sats_in_view));
                }
                if p.precision_bits != 0 {
                    push("precisionBits", FieldValue::U32(p.precision_bits));
                }
            }
            PacketBody::User(u) => {
                push("id", FieldValue::Text(u.id.clone()));
                push("longName", FieldValue::Text(u.long_name.clone()));
                push("shortName", FieldValue::Text(u.short_name.clone()));
                push(
                    "hwModel",
                    FieldValue::Text(proto::HardwareModel::name(u.hw_model)),
                );
                push("role", FieldValue::I32(u.role));
                if u.is_licensed {
                    push("licensed", FieldValue::Bool(true));
                }
            }
            PacketBody::Telemetry(t) => match t {
                TelemetryReading::Device(d) => {
                    push("metric", FieldValue::Text("device".into()));
                    if let Some(v) = d.battery_level {
                        push("batteryLevel", FieldValue::U32(v));
                    }
                    if let Some(v) = d.voltage {
                        push("voltage", FieldValue::F32(v));
                    }
                    if let Some(v) = d.channel_utilization {
                        push("channelUtilization", FieldValue::F32(v));
                    }
                    if let Some(v) = d.air_util_tx {
                        push("airUtilTx", FieldValue::F32(v));
                    }
                    if let Some(v) = d.uptime_seconds {
                        push("uptimeSeconds", FieldValue::U32(v));
                    }
                }
                TelemetryReading::Environment(e) => {
                    push("metric", FieldValue::Text("environment".into()));
                    if let Some(v) = e.temperature {
                        push("temperature", FieldValue::F32(v));
                    }
                    if let Some(v) = e.relative_humidity {
                        push("relativeHumidity", FieldValue::F32(v));
                    }
                    if let Some(v) = e.barometric_pressure {
                        push("barometricPressure", FieldValue::F32(v));
                    }
                }
                TelemetryReading::Power(p) => {
                    push("metric", FieldValue::Text("power".into()));
                    if let Some(v) = p.ch1_voltage {
                        push("ch1Voltage", FieldValue::F32(v));
                    }
                    if let Some(v) = p.ch2_voltage {
                        push("ch2Voltage", FieldValue::F32(v));
                    }
                    if let Some(v) = p.ch3_voltage {
                        push("ch3Voltage", FieldValue::F32(v));
                    }
                }
            },
            PacketBody::Routing(r) => {
                push("errorReason", FieldValue::I32(r.reason));
            }
            PacketBody::Traceroute(t) => {
                push(
                    "route",
                    FieldValue::List(t.route.iter().map(|&n| FieldValue::U32(n)).collect()),
                );
                push(
                    "snrTowards",
                    FieldValue::List(
                        t.snr_towards.iter().map(|&s| FieldValue::F32(s)).collect(),
                    ),
                );
                push(
                    "routeBack",
                    FieldValue::List(
                        t.route_back.iter().map(|&n| FieldValue::U32(n)).collect(),
                    ),
                );
                push(
                    "snrBack",
                    FieldValue::List(t.snr_back.iter().map(|&s| FieldValue::F32(s)).collect()),
                );
            }
            PacketBody::Admin(a) => match a {
                AdminResponse::Config(section) => {
                    push("response", FieldValue::Text("config".into()));
                    push("section", FieldValue::Text(section.name().into()));
                }
                AdminResponse::Channel(ch) => {
                    push("response", FieldValue::Text("channel".into()));
                    push("index", FieldValue::I32(ch.index));
                }
                AdminResponse::Owner(u) => {
                    push("response", FieldValue::Text("owner".into()));
                    push("longName", FieldValue::Text(u.long_name.clone()));
                }
                AdminResponse::ModuleConfig { section } => {
                    push("response", FieldValue::Text("moduleConfig".into()));
                    push("section", FieldValue::Text((*section).into()));
                }
                AdminResponse::Other => {
                    push("response", FieldValue::Text("other".into()));
                }
            },
            PacketBody::UnhandledPort { portnum, payload } => {
                push("portnum", FieldValue::I32(*portnum));
                push("payload", FieldValue::Hex(hex_snippet(payload, payload.len())));
            }
            PacketBody::Encrypted { payload } => {
                push("encrypted", FieldValue::Bool(true));
                push("payload", FieldValue::Hex(hex_snippet(payload, payload.len())));
            }
            PacketBody::MyNodeInfo { node_num } => {
                push("myNodeNum", FieldValue::U32(*node_num));
            }
            PacketBody::NodeInfo(n) => {
                push("num", FieldValue::U32(n.num));
                if let Some(u) = &n.user {
                    push("longName", FieldValue::Text(u.long_name.clone()));
                    push("shortName", FieldValue::Text(u.short_name.clone()));
                }
                if n.snr != 0.0 {
                    push("snr", FieldValue::F32(n.snr));
                }
                if let Some(h) = n.hops_away {
                    push("hopsAway", FieldValue::U32(h));
                }
            }
            PacketBody::Channel(ch) => {
                push("index", FieldValue::I32(ch.index));
                if let Some(s) = &ch.settings {
                    push("name", FieldValue::Text(s.name.clone()));
                }
                push("role", FieldValue::I32(ch.role));
            }
            PacketBody::Config(section) => {
                push("section", FieldValue::Text(section.name().into()));
            }
            PacketBody::ModuleConfig { section } => {
                push("section", FieldValue::Text((*section).into()));
            }
            PacketBody::QueueStatus(qs) => {
                push("res", FieldValue::I32(qs.res));
                push("free", FieldValue::U32(qs.free));
                push("maxlen", FieldValue::U32(qs.maxlen));
                push("meshPacketId", FieldValue::U32(qs.mesh_packet_id));
            }
            PacketBody::Metadata(m) => {
                push("firmwareVersion", FieldValue::Text(m.firmware_version.clone()));
                push(
                    "hwModel",
                    FieldValue::Text(proto::HardwareModel::name(m.hw_model)),
                );
            }
            PacketBody::ConfigComplete { config_id } => {
                push("configCompleteId", FieldValue::U32(*config_id));
            }
            PacketBody::LogRecord(l) => {
                push("source", FieldValue::Text(l.source.clone()));
                push("message", FieldValue::Text(l.message.clone()));
            }
            PacketBody::Rebooted | PacketBody::Unknown => {}
        }
        out
    }

    /// True when addressed to every node.
    pub fn is_broadcast(&self) -> bool {
        self.to == BROADCAST_ADDR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn packet_with(body: PacketBody) -> DecodedPacket {
        DecodedPacket {
            timestamp: Utc::now(),
            kind: PacketKind::MeshPacket,
            from: 1,
            to: BROADCAST_ADDR,
            port: Some(proto::PortNum::TextMessageApp),
            channel: 0,
            packet_id: 7,
            correlation_id: 7,
            encrypted: false,
            snr: None,
            rssi: None,
            hops: None,
            body,
            raw: Vec::new(),
        }
    }

    #[test]
    fn text_fields_projection() {
        let pkt = packet_with(PacketBody::Text(TextMessage {
            text: "hi".into(),
            reply_id: 0,
            emoji: false,
        }));
        let fields = pkt.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "text");
        assert_eq!(fields[0].1, FieldValue::Text("hi".into()));
        assert!(pkt.is_broadcast());
    }

    #[test]
    fn position_omits_absent_coordinates() {
        let pkt = packet_with(PacketBody::Position(PositionFix {
            altitude: Some(120),
            ..Default::default()
        }));
        let keys: Vec<_> = pkt.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["altitude"]);
    }
}
