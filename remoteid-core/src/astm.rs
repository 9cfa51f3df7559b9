//! ASTM F3411 (Open Drone ID) message decoder and BLE framing.
//!
//! Responsibilities:
//! - Locate the 25-byte ODID message inside BLE advertisement structures
//!   (legacy AD walk, or the looser extended-advertising scan)
//! - Dispatch on the message-type nibble and fill the matching `Uav` part
//! - Fixed-point numeric conversions (lat/lon, altitudes, speeds, direction)
//! - Message Pack unbundling, with nested packs rejected

use crate::bits::BitReader;
use crate::types::*;

/// Standard ODID message size in bytes.
pub const MESSAGE_SIZE: usize = 25;
/// Basic ID string field width.
pub const BASIC_ID_LENGTH: usize = 20;
/// Self-ID description field width.
pub const SELF_ID_LENGTH: usize = 23;
/// Operator ID string field width.
pub const OPERATOR_ID_LENGTH: usize = 20;

/// BLE AD type: Service Data, 16-bit UUID.
pub const ODID_AD_TYPE: u8 = 0x16;
/// ASTM Remote ID service UUID.
pub const ODID_SERVICE_UUID: u16 = 0xFFFA;

/// ODID message types (upper nibble of the message header byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    BasicId = 0x0,
    Location = 0x1,
    Auth = 0x2,
    SelfId = 0x3,
    System = 0x4,
    OperatorId = 0x5,
    MessagePack = 0xF,
}

/// Decoder for ASTM F3411 broadcast Remote ID.
///
/// Stateless; the same instance can decode any number of frames.
#[derive(Debug, Default)]
pub struct AstmDecoder;

impl AstmDecoder {
    /// Cheap probe: does this payload carry ODID service data?
    pub fn is_remote_id(&self, payload: &[u8]) -> bool {
        locate_legacy(payload).is_some() || locate_extended(payload).is_some()
    }

    /// Decode a complete BLE advertisement payload into `uav`.
    ///
    /// Tries the well-formed legacy AD-structure walk first; falls back to
    /// the extended-advertising scan, which tags the aircraft `BtExtended`.
    pub fn decode(&self, payload: &[u8], uav: &mut Uav) -> Result<MessageType> {
        let (msg, transport) = locate_message(payload).ok_or(RidError::NoProtocolMatch)?;
        let msg_type = self.decode_message(msg, uav)?;
        uav.protocol = ProtocolType::AstmF3411;
        uav.transport = transport;
        Ok(msg_type)
    }

    /// Decode a single ODID message (or Message Pack) into `uav`.
    pub fn decode_message(&self, data: &[u8], uav: &mut Uav) -> Result<MessageType> {
        if data.len() < MESSAGE_SIZE {
            return Err(RidError::Truncated {
                expected: MESSAGE_SIZE,
                actual: data.len(),
            });
        }

        let msg_type = (data[0] >> 4) & 0x0F;
        if msg_type == MessageType::MessagePack as u8 {
            self.decode_message_pack(data, uav)?;
            Ok(MessageType::MessagePack)
        } else {
            self.decode_single(data, uav)
        }
    }

    /// Decode one non-pack message. `data` is at least MESSAGE_SIZE bytes.
    fn decode_single(&self, data: &[u8], uav: &mut Uav) -> Result<MessageType> {
        let msg_type = (data[0] >> 4) & 0x0F;

        let decoded = match msg_type {
            0x0 => {
                self.decode_basic_id(data, uav)?;
                MessageType::BasicId
            }
            0x1 => {
                self.decode_location(data, uav)?;
                MessageType::Location
            }
            0x2 => {
                self.decode_auth(data, uav)?;
                MessageType::Auth
            }
            0x3 => {
                self.decode_self_id(data, uav)?;
                MessageType::SelfId
            }
            0x4 => {
                self.decode_system(data, uav)?;
                MessageType::System
            }
            0x5 => {
                self.decode_operator_id(data, uav)?;
                MessageType::OperatorId
            }
            other => return Err(RidError::UnknownMessageType(other)),
        };

        uav.message_count += 1;
        Ok(decoded)
    }

    fn decode_basic_id(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        let mut r = BitReader::new(data);
        r.skip(1)?;
        let type_byte = r.read_u8()?;
        uav.id_type = UavIdType::from_bits((type_byte >> 4) & 0x0F);
        uav.uav_type = UavType::from_bits(type_byte & 0x0F);
        uav.id = trim_wire_string(r.read_bytes(BASIC_ID_LENGTH)?);
        Ok(())
    }

    fn decode_location(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        let mut r = BitReader::new(data);
        r.skip(1)?;

        let status_byte = r.read_u8()?;
        let loc = &mut uav.location;
        loc.status = UavStatus::from_bits((status_byte >> 4) & 0x0F);
        loc.height_ref = if (status_byte >> 2) & 0x01 != 0 {
            HeightReference::Ground
        } else {
            HeightReference::Takeoff
        };
        let speed_mult = status_byte & 0x01 != 0;

        loc.direction = decode_direction(r.read_u8()? as u16);
        loc.speed_horizontal = decode_speed(r.read_u8()?, speed_mult);
        loc.speed_vertical = decode_vertical_speed(r.read_i8()?);

        loc.latitude = decode_lat_lon(r.read_i32()?);
        loc.longitude = decode_lat_lon(r.read_i32()?);

        loc.altitude_baro = decode_altitude(r.read_u16()?);
        loc.altitude_geo = decode_altitude(r.read_u16()?);
        loc.height = decode_altitude(r.read_u16()?);

        let accuracy = r.read_u8()?;
        loc.h_accuracy = HorizontalAccuracy::from_bits((accuracy >> 4) & 0x0F);
        loc.v_accuracy = VerticalAccuracy::from_bits(accuracy & 0x0F);
        loc.speed_accuracy = SpeedAccuracy::from_bits(r.read_u8()? & 0x0F);

        loc.timestamp_offset = r.read_u16()?;
        loc.valid = true;
        Ok(())
    }

    fn decode_auth(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        // Kept opaque: byte 1 is (auth_type << 4) | page, the rest is the page
        // payload. Interpretation is up to the caller.
        uav.auth_data = data[1..MESSAGE_SIZE].to_vec();
        Ok(())
    }

    fn decode_self_id(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        let mut r = BitReader::new(data);
        r.skip(1)?;
        uav.self_id.description_type = r.read_u8()?;
        uav.self_id.description = trim_wire_string(r.read_bytes(SELF_ID_LENGTH)?);
        uav.self_id.valid = true;
        Ok(())
    }

    fn decode_system(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        let mut r = BitReader::new(data);
        r.skip(1)?;

        let sys = &mut uav.system;
        sys.location_type = OperatorLocationType::from_bits((r.read_u8()? >> 4) & 0x03);
        sys.operator_latitude = decode_lat_lon(r.read_i32()?);
        sys.operator_longitude = decode_lat_lon(r.read_i32()?);
        sys.area_count = r.read_u16()?;
        sys.area_radius = r.read_u8()? as u16 * 10;
        sys.area_ceiling = decode_altitude(r.read_u16()?);
        sys.area_floor = decode_altitude(r.read_u16()?);
        sys.timestamp = r.read_u32()?;
        sys.valid = true;
        Ok(())
    }

    fn decode_operator_id(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        let mut r = BitReader::new(data);
        r.skip(1)?;
        uav.operator_id.id_type = r.read_u8()?;
        uav.operator_id.id = trim_wire_string(r.read_bytes(OPERATOR_ID_LENGTH)?);
        uav.operator_id.valid = true;
        Ok(())
    }

    /// Unbundle a Message Pack: up to 9 consecutive 25-byte child messages.
    ///
    /// Children are decoded best-effort; a failing child does not abort the
    /// rest. A child whose own type nibble is 0xF (a nested pack) is skipped.
    fn decode_message_pack(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        let pack_info = data[1];
        let msg_size = (((pack_info >> 4) & 0x0F) as usize) + 1;
        let msg_count = (pack_info & 0x0F) as usize;

        if msg_size != MESSAGE_SIZE {
            return Err(RidError::Truncated {
                expected: MESSAGE_SIZE,
                actual: msg_size,
            });
        }

        let mut offset = 2;
        let mut decoded = 0usize;
        for _ in 0..msg_count {
            if offset + MESSAGE_SIZE > data.len() {
                break;
            }
            let child = &data[offset..offset + MESSAGE_SIZE];
            offset += MESSAGE_SIZE;

            if (child[0] >> 4) & 0x0F == MessageType::MessagePack as u8 {
                continue;
            }
            if self.decode_single(child, uav).is_ok() {
                decoded += 1;
            }
        }

        if decoded == 0 {
            return Err(RidError::Truncated {
                expected: 2 + MESSAGE_SIZE * msg_count,
                actual: data.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Locate the ODID message in a BLE payload: the legacy AD-structure walk
/// first, then the extended-advertising scan. Returns the message bytes and
/// the transport they imply.
pub(crate) fn locate_message(payload: &[u8]) -> Option<(&[u8], TransportType)> {
    if let Some(msg) = locate_legacy(payload) {
        return Some((msg, TransportType::BtLegacy));
    }
    locate_extended(payload).map(|msg| (msg, TransportType::BtExtended))
}

/// Walk legacy BLE AD structures looking for ODID service data.
///
/// Layout: `[ad_len][ad_type=0x16][uuid_lo=0xFA][uuid_hi=0xFF][counter][msg]`.
/// Returns the message bytes after the counter. The `ad_len >= 4` gate keeps
/// the `ad_len - 3` length arithmetic from underflowing.
fn locate_legacy(payload: &[u8]) -> Option<&[u8]> {
    let mut i = 0usize;
    while i + 4 < payload.len() {
        let ad_len = payload[i] as usize;
        if ad_len == 0 || i + ad_len >= payload.len() {
            break;
        }

        if ad_len >= 4 && payload[i + 1] == ODID_AD_TYPE {
            let uuid = u16::from_le_bytes([payload[i + 2], payload[i + 3]]);
            if uuid == ODID_SERVICE_UUID {
                // ad_len - 3 bytes of service data follow the UUID
                let mut msg = &payload[i + 4..i + 1 + ad_len];
                // Skip the message counter byte
                if !msg.is_empty() {
                    msg = &msg[1..];
                }
                return Some(msg);
            }
        }

        i += ad_len + 1;
    }
    None
}

/// Extended-advertising (BT5) fallback: the same service-data prefix can sit
/// anywhere in the looser container, with no counter byte. Returns the bytes
/// following the first `16 FA FF` prefix.
fn locate_extended(payload: &[u8]) -> Option<&[u8]> {
    let uuid = ODID_SERVICE_UUID.to_le_bytes();
    payload
        .windows(3)
        .position(|w| w == [ODID_AD_TYPE, uuid[0], uuid[1]])
        .map(|i| &payload[i + 3..])
}

// ---------------------------------------------------------------------------
// Fixed-point conversions
// ---------------------------------------------------------------------------

const LAT_LON_MULTIPLIER: f64 = 1e-7;
const ALTITUDE_MULTIPLIER: f32 = 0.5;
const ALTITUDE_OFFSET: f32 = -1000.0;
const SPEED_MULTIPLIER: f32 = 0.25;
const SPEED_MULTIPLIER_HIGH: f32 = 0.75;
const SPEED_OFFSET_HIGH: f32 = 63.75;

/// Latitude/longitude: degrees × 10⁷ on the wire. Out-of-range values are
/// surfaced as-is, not clamped.
pub fn decode_lat_lon(encoded: i32) -> f64 {
    encoded as f64 * LAT_LON_MULTIPLIER
}

/// Altitude: 0.5-m units offset by −1000 m; the raw value 0 means "unset".
pub fn decode_altitude(encoded: u16) -> f32 {
    if encoded == 0 {
        return 0.0;
    }
    encoded as f32 * ALTITUDE_MULTIPLIER + ALTITUDE_OFFSET
}

/// Horizontal speed. The multiplier bit selects the coarse range; raw 255 is
/// the "unavailable" sentinel.
pub fn decode_speed(encoded: u8, high_multiplier: bool) -> f32 {
    if encoded == 255 {
        return f32::NAN;
    }
    if high_multiplier {
        encoded as f32 * SPEED_MULTIPLIER_HIGH + SPEED_OFFSET_HIGH
    } else {
        encoded as f32 * SPEED_MULTIPLIER
    }
}

/// Vertical speed: signed 0.5-m/s units; raw 63 is "unavailable".
pub fn decode_vertical_speed(encoded: i8) -> f32 {
    if encoded == 63 {
        return f32::NAN;
    }
    encoded as f32 * 0.5
}

/// Track direction in whole degrees; values above 360 are "unavailable".
pub fn decode_direction(encoded: u16) -> f32 {
    if encoded > 360 {
        return f32::NAN;
    }
    encoded as f32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
