//! Shared builders for integration tests: craft inbound `FromRadio` frames
//! the way the device would emit them.

#![allow(dead_code)]

use prost::Message;

use meshlink::proto;

/// Serialize a FromRadio envelope carrying one mesh packet.
pub fn mesh_packet_frame(mp: proto::MeshPacket) -> Vec<u8> {
    proto::FromRadio {
        id: 0,
        payload_variant: Some(proto::from_radio::PayloadVariant::Packet(mp)),
    }
    .encode_to_vec()
}

/// Text message packet as received from `from`.
pub fn text_frame(from: u32, to: u32, channel: u32, text: &str) -> Vec<u8> {
    mesh_packet_frame(proto::MeshPacket {
        from,
        to,
        channel,
        id: 0x1000u32.wrapping_add(from),
        payload_variant: Some(proto::mesh_packet::PayloadVariant::Decoded(proto::Data {
            portnum: proto::PortNum::TextMessageApp as i32,
            payload: text.as_bytes().to_vec().into(),
            ..Default::default()
        })),
        ..Default::default()
    })
}

/// Routing response for `request_id` with the given reason, sent by `from`.
pub fn routing_frame(from: u32, request_id: u32, reason: i32) -> Vec<u8> {
    let routing = proto::Routing {
        variant: Some(proto::routing::Variant::ErrorReason(reason)),
    };
    mesh_packet_frame(proto::MeshPacket {
        from,
        to: 0x01020304,
        id: 0xABCD,
        payload_variant: Some(proto::mesh_packet::PayloadVariant::Decoded(proto::Data {
            portnum: proto::PortNum::RoutingApp as i32,
            payload: routing.encode_to_vec().into(),
            request_id,
            ..Default::default()
        })),
        ..Default::default()
    })
}

/// Position report from `from` at the given scaled-integer coordinates.
pub fn position_frame(from: u32, latitude_i: i32, longitude_i: i32, altitude: i32) -> Vec<u8> {
    let pos = proto::Position {
        latitude_i: Some(latitude_i),
        longitude_i: Some(longitude_i),
        altitude: Some(altitude),
        ..Default::default()
    };
    mesh_packet_frame(proto::MeshPacket {
        from,
        to: 0xFFFF_FFFF,
        id: 0x2000 + from,
        payload_variant: Some(proto::mesh_packet::PayloadVariant::Decoded(proto::Data {
            portnum: proto::PortNum::PositionApp as i32,
            payload: pos.encode_to_vec().into(),
            ..Default::default()
        })),
        ..Default::default()
    })
}

/// Device telemetry from `from`.
pub fn device_telemetry_frame(from: u32, battery_level: u32, voltage: f32) -> Vec<u8> {
    let telemetry = proto::Telemetry {
        time: 0,
        variant: Some(proto::telemetry::Variant::DeviceMetrics(
            proto::DeviceMetrics {
                battery_level: Some(battery_level),
                voltage: Some(voltage),
                ..Default::default()
            },
        )),
    };
    mesh_packet_frame(proto::MeshPacket {
        from,
        to: 0xFFFF_FFFF,
        id: 0x3000 + from,
        payload_variant: Some(proto::mesh_packet::PayloadVariant::Decoded(proto::Data {
            portnum: proto::PortNum::TelemetryApp as i32,
            payload: telemetry.encode_to_vec().into(),
            ..Default::default()
        })),
        ..Default::default()
    })
}

/// Config-complete marker echoing `config_id`.
pub fn config_complete_frame(config_id: u32) -> Vec<u8> {
    proto::FromRadio {
        id: 0,
        payload_variant: Some(proto::from_radio::PayloadVariant::ConfigCompleteId(config_id)),
    }
    .encode_to_vec()
}
