//! Fixed-layout binary codec for AODV control frames and the RSSI beacon.
//!
//! All layouts are little-endian, packed, with no padding, per the wire
//! format table in the base spec. A control frame is discriminated by its
//! first payload byte (`1` = RREQ, `2` = RREP) rather than a shared packed
//! struct, per the Design Notes ("tagged variants for control frames").

use crate::error::RouterError;
use crate::node_id::NodeId;

/// Route request control payload (25 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RreqPacket {
    pub source: NodeId,
    pub destination: NodeId,
    pub broadcast_id: u32,
    pub route_request_id: u32,
    pub hop_count: u16,
    pub rssi: i8,
    pub sequence_number: u32,
}

impl RreqPacket {
    pub const WIRE_SIZE: usize = 25;
    pub const PACKET_TYPE: u8 = 1;

    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        buf[0..4].copy_from_slice(&self.source.as_u32().to_le_bytes());
        buf[4..8].copy_from_slice(&self.destination.as_u32().to_le_bytes());
        buf[8..12].copy_from_slice(&self.broadcast_id.to_le_bytes());
        buf[12..16].copy_from_slice(&self.route_request_id.to_le_bytes());
        buf[16..18].copy_from_slice(&self.hop_count.to_le_bytes());
        buf[18] = self.rssi as u8;
        buf[19] = Self::PACKET_TYPE;
        buf[20..24].copy_from_slice(&self.sequence_number.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RouterError> {
        if bytes.len() < Self::WIRE_SIZE {
            return Err(RouterError::MalformedFrame("rreq payload too short"));
        }
        Ok(Self {
            source: NodeId::new(u32::from_le_bytes(bytes[0..4].try_into().unwrap())),
            destination: NodeId::new(u32::from_le_bytes(bytes[4..8].try_into().unwrap())),
            broadcast_id: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            route_request_id: u32::from_le_bytes(bytes[12..16].try_into().unwrap()),
            hop_count: u16::from_le_bytes(bytes[16..18].try_into().unwrap()),
            rssi: bytes[18] as i8,
            sequence_number: u32::from_le_bytes(bytes[20..24].try_into().unwrap()),
        })
    }
}

/// Route reply control payload (21 bytes on the wire): same shape as
/// [`RreqPacket`] minus `broadcast_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RrepPacket {
    pub source: NodeId,
    pub destination: NodeId,
    pub route_request_id: u32,
    pub hop_count: u16,
    pub rssi: i8,
    pub sequence_number: u32,
}

impl RrepPacket {
    pub const WIRE_SIZE: usize = 21;
    pub const PACKET_TYPE: u8 = 2;

    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        buf[0..4].copy_from_slice(&self.source.as_u32().to_le_bytes());
        buf[4..8].copy_from_slice(&self.destination.as_u32().to_le_bytes());
        buf[8..12].copy_from_slice(&self.route_request_id.to_le_bytes());
        buf[12..14].copy_from_slice(&self.hop_count.to_le_bytes());
        buf[14] = self.rssi as u8;
        buf[15] = Self::PACKET_TYPE;
        buf[16..20].copy_from_slice(&self.sequence_number.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RouterError> {
        if bytes.len() < Self::WIRE_SIZE {
            return Err(RouterError::MalformedFrame("rrep payload too short"));
        }
        Ok(Self {
            source: NodeId::new(u32::from_le_bytes(bytes[0..4].try_into().unwrap())),
            destination: NodeId::new(u32::from_le_bytes(bytes[4..8].try_into().unwrap())),
            route_request_id: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            hop_count: u16::from_le_bytes(bytes[12..14].try_into().unwrap()),
            rssi: bytes[14] as i8,
            sequence_number: u32::from_le_bytes(bytes[16..20].try_into().unwrap()),
        })
    }
}

/// An AODV control frame, discriminated by its first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrame {
    Rreq(RreqPacket),
    Rrep(RrepPacket),
}

impl ControlFrame {
    /// Parse a control frame from an AODV-port payload.
    pub fn parse(payload: &[u8]) -> Result<Self, RouterError> {
        match payload.first() {
            Some(&RreqPacket::PACKET_TYPE) => Ok(ControlFrame::Rreq(RreqPacket::from_bytes(payload)?)),
            Some(&RrepPacket::PACKET_TYPE) => Ok(ControlFrame::Rrep(RrepPacket::from_bytes(payload)?)),
            Some(_) | None => Err(RouterError::MalformedFrame("unknown control packet_type")),
        }
    }
}

/// Encode the one-byte RSSI beacon payload.
pub fn encode_beacon(rssi: i8) -> [u8; 1] {
    [rssi as u8]
}

/// Decode the one-byte RSSI beacon payload.
pub fn decode_beacon(payload: &[u8]) -> Result<i8, RouterError> {
    payload
        .first()
        .map(|&b| b as i8)
        .ok_or(RouterError::MalformedFrame("beacon payload too short"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rreq() -> RreqPacket {
        RreqPacket {
            source: NodeId::new(1),
            destination: NodeId::new(200),
            broadcast_id: 7,
            route_request_id: 7,
            hop_count: 2,
            rssi: -70,
            sequence_number: 5,
        }
    }

    fn sample_rrep() -> RrepPacket {
        RrepPacket {
            source: NodeId::new(100),
            destination: NodeId::new(1),
            route_request_id: 7,
            hop_count: 0,
            rssi: -65,
            sequence_number: 5,
        }
    }

    #[test]
    fn rreq_roundtrip() {
        let rreq = sample_rreq();
        let bytes = rreq.to_bytes();
        assert_eq!(bytes.len(), RreqPacket::WIRE_SIZE);
        assert_eq!(RreqPacket::from_bytes(&bytes).unwrap(), rreq);
    }

    #[test]
    fn rrep_roundtrip() {
        let rrep = sample_rrep();
        let bytes = rrep.to_bytes();
        assert_eq!(bytes.len(), RrepPacket::WIRE_SIZE);
        assert_eq!(RrepPacket::from_bytes(&bytes).unwrap(), rrep);
    }

    #[test]
    fn rreq_truncated_is_malformed() {
        let bytes = sample_rreq().to_bytes();
        assert!(RreqPacket::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn control_frame_dispatches_by_packet_type() {
        let rreq_bytes = sample_rreq().to_bytes();
        match ControlFrame::parse(&rreq_bytes).unwrap() {
            ControlFrame::Rreq(_) => {}
            ControlFrame::Rrep(_) => panic!("expected RREQ"),
        }

        let rrep_bytes = sample_rrep().to_bytes();
        match ControlFrame::parse(&rrep_bytes).unwrap() {
            ControlFrame::Rrep(_) => {}
            ControlFrame::Rreq(_) => panic!("expected RREP"),
        }
    }

    #[test]
    fn control_frame_rejects_unknown_type() {
        let mut bytes = sample_rreq().to_bytes().to_vec();
        bytes[19] = 9;
        assert!(ControlFrame::parse(&bytes).is_err());
    }

    #[test]
    fn beacon_roundtrip() {
        let bytes = encode_beacon(-42);
        assert_eq!(decode_beacon(&bytes).unwrap(), -42);
    }

    #[test]
    fn beacon_empty_payload_is_malformed() {
        assert!(decode_beacon(&[]).is_err());
    }
}
