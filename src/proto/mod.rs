//! Wire-protocol message types for the Meshtastic serial API.
//!
//! These are hand-written `prost` message definitions covering the subset of
//! the device protocol this crate speaks: the `FromRadio`/`ToRadio` envelope
//! unions, `MeshPacket`/`Data`, the per-port payloads (text, position, user,
//! telemetry, routing, traceroute, admin) and the config/module-config
//! sections streamed during the config handshake. Tags follow the upstream
//! protobuf definitions so frames interoperate with real firmware.
//!
//! Fields the crate never reads are omitted; protobuf skips unknown tags on
//! decode, so partial message definitions stay wire-compatible.

use bytes::Bytes;

/// Maximum payload accepted inside one serial frame.
pub const MAX_FRAME_PAYLOAD: usize = 512;

// ---------------------------------------------------------------------------
// Envelope unions
// ---------------------------------------------------------------------------

/// Radio -> client envelope. Exactly one variant is set per frame.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FromRadio {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(
        oneof = "from_radio::PayloadVariant",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13"
    )]
    pub payload_variant: Option<from_radio::PayloadVariant>,
}

pub mod from_radio {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "2")]
        Packet(super::MeshPacket),
        #[prost(message, tag = "3")]
        MyInfo(super::MyNodeInfo),
        #[prost(message, tag = "4")]
        NodeInfo(super::NodeInfo),
        #[prost(message, tag = "5")]
        Config(super::Config),
        #[prost(message, tag = "6")]
        LogRecord(super::LogRecord),
        #[prost(uint32, tag = "7")]
        ConfigCompleteId(u32),
        #[prost(bool, tag = "8")]
        Rebooted(bool),
        #[prost(message, tag = "9")]
        ModuleConfig(super::ModuleConfig),
        #[prost(message, tag = "10")]
        Channel(super::Channel),
        #[prost(message, tag = "11")]
        QueueStatus(super::QueueStatus),
        #[prost(message, tag = "13")]
        Metadata(super::DeviceMetadata),
    }
}

/// Client -> radio envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToRadio {
    #[prost(oneof = "to_radio::PayloadVariant", tags = "1, 3, 4, 7")]
    pub payload_variant: Option<to_radio::PayloadVariant>,
}

pub mod to_radio {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "1")]
        Packet(super::MeshPacket),
        #[prost(uint32, tag = "3")]
        WantConfigId(u32),
        #[prost(bool, tag = "4")]
        Disconnect(bool),
        #[prost(message, tag = "7")]
        Heartbeat(super::Heartbeat),
    }
}

/// Keep-alive sent by the client while the link is open.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Heartbeat {
    #[prost(uint32, tag = "1")]
    pub nonce: u32,
}

// ---------------------------------------------------------------------------
// Mesh packets
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeshPacket {
    #[prost(fixed32, tag = "1")]
    pub from: u32,
    #[prost(fixed32, tag = "2")]
    pub to: u32,
    #[prost(uint32, tag = "3")]
    pub channel: u32,
    #[prost(oneof = "mesh_packet::PayloadVariant", tags = "4, 5")]
    pub payload_variant: Option<mesh_packet::PayloadVariant>,
    #[prost(fixed32, tag = "6")]
    pub id: u32,
    #[prost(fixed32, tag = "7")]
    pub rx_time: u32,
    #[prost(float, tag = "8")]
    pub rx_snr: f32,
    #[prost(uint32, tag = "9")]
    pub hop_limit: u32,
    #[prost(bool, tag = "10")]
    pub want_ack: bool,
    #[prost(uint32, tag = "11")]
    pub priority: u32,
    #[prost(int32, tag = "12")]
    pub rx_rssi: i32,
    #[prost(bool, tag = "14")]
    pub via_mqtt: bool,
    #[prost(uint32, tag = "15")]
    pub hop_start: u32,
}

pub mod mesh_packet {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Plaintext application payload, tagged with a port number.
        #[prost(message, tag = "4")]
        Decoded(super::Data),
        /// Channel-encrypted payload; passed through opaque by this crate.
        #[prost(bytes = "bytes", tag = "5")]
        Encrypted(::prost::bytes::Bytes),
    }
}

/// Inner application payload of a decrypted mesh packet.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Data {
    #[prost(enumeration = "PortNum", tag = "1")]
    pub portnum: i32,
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
    #[prost(bool, tag = "3")]
    pub want_response: bool,
    #[prost(fixed32, tag = "4")]
    pub dest: u32,
    #[prost(fixed32, tag = "5")]
    pub source: u32,
    /// For responses: id of the request this answers. Overrides the packet id
    /// for correlation when nonzero.
    #[prost(fixed32, tag = "6")]
    pub request_id: u32,
    #[prost(fixed32, tag = "7")]
    pub reply_id: u32,
    #[prost(fixed32, tag = "8")]
    pub emoji: u32,
    #[prost(uint32, optional, tag = "9")]
    pub bitfield: Option<u32>,
}

/// Application port numbers carried in [`Data::portnum`]. Wire identifiers
/// are stable; consumers key decode/format logic off these integers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
)]
#[repr(i32)]
pub enum PortNum {
    UnknownApp = 0,
    TextMessageApp = 1,
    PositionApp = 3,
    NodeinfoApp = 4,
    RoutingApp = 5,
    AdminApp = 6,
    TextMessageCompressedApp = 7,
    TelemetryApp = 67,
    TracerouteApp = 70,
    NeighborinfoApp = 71,
}

// ---------------------------------------------------------------------------
// Per-port payloads
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Position {
    #[prost(sfixed32, optional, tag = "1")]
    pub latitude_i: Option<i32>,
    #[prost(sfixed32, optional, tag = "2")]
    pub longitude_i: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub altitude: Option<i32>,
    #[prost(fixed32, tag = "4")]
    pub time: u32,
    #[prost(sint32, optional, tag = "9")]
    pub altitude_hae: Option<i32>,
    #[prost(uint32, optional, tag = "15")]
    pub ground_speed: Option<u32>,
    #[prost(uint32, optional, tag = "16")]
    pub ground_track: Option<u32>,
    #[prost(uint32, tag = "19")]
    pub sats_in_view: u32,
    #[prost(uint32, tag = "23")]
    pub precision_bits: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub long_name: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(enumeration = "HardwareModel", tag = "5")]
    pub hw_model: i32,
    #[prost(bool, tag = "6")]
    pub is_licensed: bool,
    #[prost(int32, tag = "7")]
    pub role: i32,
}

/// Hardware model codes we can name; anything else renders as `HW_<n>`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
)]
#[repr(i32)]
pub enum HardwareModel {
    Unset = 0,
    TloraV2 = 1,
    TloraV1 = 2,
    Tbeam = 4,
    HeltecV2 = 5,
    TEcho = 7,
    Rak4631 = 9,
    HeltecV21 = 10,
    StationG1 = 25,
    HeltecV3 = 43,
    HeltecWslV3 = 44,
    TDeck = 46,
    TWatchS3 = 47,
}

impl HardwareModel {
    pub fn name(code: i32) -> String {
        match Self::try_from(code) {
            Ok(Self::Unset) => "UNSET".into(),
            Ok(Self::TloraV2) => "TLORA_V2".into(),
            Ok(Self::TloraV1) => "TLORA_V1".into(),
            Ok(Self::Tbeam) => "TBEAM".into(),
            Ok(Self::HeltecV2) => "HELTEC_V2".into(),
            Ok(Self::TEcho) => "T_ECHO".into(),
            Ok(Self::Rak4631) => "RAK4631".into(),
            Ok(Self::HeltecV21) => "HELTEC_V2_1".into(),
            Ok(Self::StationG1) => "STATION_G1".into(),
            Ok(Self::HeltecV3) => "HELTEC_V3".into(),
            Ok(Self::HeltecWslV3) => "HELTEC_WSL_V3".into(),
            Ok(Self::TDeck) => "T_DECK".into(),
            Ok(Self::TWatchS3) => "T_WATCH_S3".into(),
            Err(_) => format!("HW_{}", code),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Routing {
    #[prost(oneof = "routing::Variant", tags = "1, 2, 3")]
    pub variant: Option<routing::Variant>,
}

pub mod routing {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "1")]
        RouteRequest(super::RouteDiscovery),
        #[prost(message, tag = "2")]
        RouteReply(super::RouteDiscovery),
        #[prost(enumeration = "Error", tag = "3")]
        ErrorReason(i32),
    }

    /// Delivery outcome reported by the routing layer.
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum Error {
        None = 0,
        NoRoute = 1,
        GotNak = 2,
        Timeout = 3,
        NoInterface = 4,
        MaxRetransmit = 5,
        NoChannel = 6,
        TooLarge = 7,
        NoResponse = 8,
        DutyCycleLimit = 9,
        BadRequest = 32,
        NotAuthorized = 33,
    }
}

/// Traceroute record: node ids and per-hop SNR for both directions.
/// SNR values are stored on the wire as dB x 4.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteDiscovery {
    #[prost(fixed32, repeated, tag = "1")]
    pub route: Vec<u32>,
    #[prost(int32, repeated, tag = "2")]
    pub snr_towards: Vec<i32>,
    #[prost(fixed32, repeated, tag = "3")]
    pub route_back: Vec<u32>,
    #[prost(int32, repeated, tag = "4")]
    pub snr_back: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Telemetry {
    #[prost(fixed32, tag = "1")]
    pub time: u32,
    #[prost(oneof = "telemetry::Variant", tags = "2, 3, 5")]
    pub variant: Option<telemetry::Variant>,
}

pub mod telemetry {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "2")]
        DeviceMetrics(super::DeviceMetrics),
        #[prost(message, tag = "3")]
        EnvironmentMetrics(super::EnvironmentMetrics),
        #[prost(message, tag = "5")]
        PowerMetrics(super::PowerMetrics),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetrics {
    #[prost(uint32, optional, tag = "1")]
    pub battery_level: Option<u32>,
    #[prost(float, optional, tag = "2")]
    pub voltage: Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub channel_utilization: Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub air_util_tx: Option<f32>,
    #[prost(uint32, optional, tag = "5")]
    pub uptime_seconds: Option<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnvironmentMetrics {
    #[prost(float, optional, tag = "1")]
    pub temperature: Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub relative_humidity: Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub barometric_pressure: Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub voltage: Option<f32>,
    #[prost(float, optional, tag = "6")]
    pub current: Option<f32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PowerMetrics {
    #[prost(float, optional, tag = "1")]
    pub ch1_voltage: Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub ch1_current: Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub ch2_voltage: Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub ch2_current: Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub ch3_voltage: Option<f32>,
    #[prost(float, optional, tag = "6")]
    pub ch3_current: Option<f32>,
}

// ---------------------------------------------------------------------------
// Node database / handshake stream
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MyNodeInfo {
    #[prost(uint32, tag = "1")]
    pub my_node_num: u32,
    #[prost(uint32, tag = "8")]
    pub reboot_count: u32,
    #[prost(uint32, tag = "11")]
    pub min_app_version: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeInfo {
    #[prost(uint32, tag = "1")]
    pub num: u32,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(message, optional, tag = "3")]
    pub position: Option<Position>,
    #[prost(float, tag = "4")]
    pub snr: f32,
    #[prost(fixed32, tag = "5")]
    pub last_heard: u32,
    #[prost(message, optional, tag = "6")]
    pub device_metrics: Option<DeviceMetrics>,
    #[prost(uint32, tag = "7")]
    pub channel: u32,
    #[prost(bool, tag = "8")]
    pub via_mqtt: bool,
    #[prost(uint32, optional, tag = "9")]
    pub hops_away: Option<u32>,
    #[prost(bool, tag = "10")]
    pub is_favorite: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Channel {
    #[prost(int32, tag = "1")]
    pub index: i32,
    #[prost(message, optional, tag = "2")]
    pub settings: Option<ChannelSettings>,
    /// 0 = disabled, 1 = primary, 2 = secondary
    #[prost(int32, tag = "3")]
    pub role: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelSettings {
    #[prost(bytes = "bytes", tag = "2")]
    pub psk: Bytes,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(fixed32, tag = "4")]
    pub id: u32,
    #[prost(bool, tag = "5")]
    pub uplink_enabled: bool,
    #[prost(bool, tag = "6")]
    pub downlink_enabled: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueueStatus {
    #[prost(int32, tag = "1")]
    pub res: i32,
    #[prost(uint32, tag = "2")]
    pub free: u32,
    #[prost(uint32, tag = "3")]
    pub maxlen: u32,
    #[prost(uint32, tag = "4")]
    pub mesh_packet_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetadata {
    #[prost(string, tag = "1")]
    pub firmware_version: String,
    #[prost(uint32, tag = "2")]
    pub device_state_version: u32,
    #[prost(bool, tag = "3")]
    pub can_shutdown: bool,
    #[prost(bool, tag = "4")]
    pub has_wifi: bool,
    #[prost(bool, tag = "5")]
    pub has_bluetooth: bool,
    #[prost(enumeration = "HardwareModel", tag = "9")]
    pub hw_model: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogRecord {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(fixed32, tag = "2")]
    pub time: u32,
    #[prost(string, tag = "3")]
    pub source: String,
    #[prost(int32, tag = "4")]
    pub level: i32,
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Config {
    #[prost(oneof = "config::PayloadVariant", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub payload_variant: Option<config::PayloadVariant>,
}

pub mod config {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "1")]
        Device(DeviceConfig),
        #[prost(message, tag = "2")]
        Position(PositionConfig),
        #[prost(message, tag = "3")]
        Power(PowerConfig),
        #[prost(message, tag = "4")]
        Network(NetworkConfig),
        #[prost(message, tag = "5")]
        Display(DisplayConfig),
        #[prost(message, tag = "6")]
        Lora(LoRaConfig),
        #[prost(message, tag = "7")]
        Bluetooth(BluetoothConfig),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeviceConfig {
        #[prost(int32, tag = "1")]
        pub role: i32,
        #[prost(uint32, tag = "7")]
        pub node_info_broadcast_secs: u32,
        #[prost(string, tag = "11")]
        pub tzdef: String,
        #[prost(bool, tag = "12")]
        pub led_heartbeat_disabled: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PositionConfig {
        #[prost(uint32, tag = "1")]
        pub position_broadcast_secs: u32,
        #[prost(bool, tag = "2")]
        pub position_broadcast_smart_enabled: bool,
        #[prost(bool, tag = "3")]
        pub fixed_position: bool,
        #[prost(uint32, tag = "5")]
        pub gps_update_interval: u32,
        #[prost(uint32, tag = "10")]
        pub position_flags: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PowerConfig {
        #[prost(bool, tag = "1")]
        pub is_power_saving: bool,
        #[prost(uint32, tag = "2")]
        pub on_battery_shutdown_after_secs: u32,
        #[prost(uint32, tag = "7")]
        pub ls_secs: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NetworkConfig {
        #[prost(bool, tag = "1")]
        pub wifi_enabled: bool,
        #[prost(string, tag = "3")]
        pub wifi_ssid: String,
        #[prost(string, tag = "4")]
        pub wifi_psk: String,
        #[prost(string, tag = "5")]
        pub ntp_server: String,
        #[prost(bool, tag = "6")]
        pub eth_enabled: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DisplayConfig {
        #[prost(uint32, tag = "1")]
        pub screen_on_secs: u32,
        #[prost(uint32, tag = "3")]
        pub auto_screen_carousel_secs: u32,
        #[prost(bool, tag = "5")]
        pub flip_screen: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoRaConfig {
        #[prost(bool, tag = "1")]
        pub use_preset: bool,
        #[prost(int32, tag = "2")]
        pub modem_preset: i32,
        #[prost(int32, tag = "7")]
        pub region: i32,
        #[prost(uint32, tag = "8")]
        pub hop_limit: u32,
        #[prost(bool, tag = "9")]
        pub tx_enabled: bool,
        #[prost(int32, tag = "10")]
        pub tx_power: i32,
        #[prost(uint32, tag = "11")]
        pub channel_num: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct BluetoothConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(int32, tag = "2")]
        pub mode: i32,
        #[prost(uint32, tag = "3")]
        pub fixed_pin: u32,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModuleConfig {
    #[prost(oneof = "module_config::PayloadVariant", tags = "1, 2, 6")]
    pub payload_variant: Option<module_config::PayloadVariant>,
}

pub mod module_config {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "1")]
        Mqtt(MqttConfig),
        #[prost(message, tag = "2")]
        Serial(SerialConfig),
        #[prost(message, tag = "6")]
        Telemetry(TelemetryConfig),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MqttConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(string, tag = "2")]
        pub address: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SerialConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TelemetryConfig {
        #[prost(uint32, tag = "1")]
        pub device_update_interval: u32,
        #[prost(uint32, tag = "2")]
        pub environment_update_interval: u32,
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdminMessage {
    #[prost(
        oneof = "admin_message::PayloadVariant",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 32, 33, 34, 35, 97"
    )]
    pub payload_variant: Option<admin_message::PayloadVariant>,
}

pub mod admin_message {
    /// Which config section a get-config request asks for. Values mirror
    /// [`super::config::PayloadVariant`] tags minus one.
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum ConfigType {
        DeviceConfig = 0,
        PositionConfig = 1,
        PowerConfig = 2,
        NetworkConfig = 3,
        DisplayConfig = 4,
        LoraConfig = 5,
        BluetoothConfig = 6,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(uint32, tag = "1")]
        GetChannelRequest(u32),
        #[prost(message, tag = "2")]
        GetChannelResponse(super::Channel),
        #[prost(bool, tag = "3")]
        GetOwnerRequest(bool),
        #[prost(message, tag = "4")]
        GetOwnerResponse(super::User),
        #[prost(enumeration = "ConfigType", tag = "5")]
        GetConfigRequest(i32),
        #[prost(message, tag = "6")]
        GetConfigResponse(super::Config),
        #[prost(int32, tag = "7")]
        GetModuleConfigRequest(i32),
        #[prost(message, tag = "8")]
        GetModuleConfigResponse(super::ModuleConfig),
        #[prost(message, tag = "32")]
        SetOwner(super::User),
        #[prost(message, tag = "33")]
        SetChannel(super::Channel),
        #[prost(message, tag = "34")]
        SetConfig(super::Config),
        #[prost(message, tag = "35")]
        SetModuleConfig(super::ModuleConfig),
        #[prost(int32, tag = "97")]
        RebootSeconds(i32),
    }
}
