//! Shared types, error enum, and the merged aircraft record for remoteid-core.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

/// All errors produced by remoteid-core.
///
/// Decode errors are returned, never thrown: a failed decode leaves the
/// session registry untouched and surfaces here via `ParseResult.error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RidError {
    #[error("Empty payload")]
    EmptyPayload,
    #[error("No matching protocol decoder")]
    NoProtocolMatch,
    #[error("Message truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("Unknown message type {0:#03x}")]
    UnknownMessageType(u8),
    #[error("Framing underflow")]
    FramingUnderflow,
    #[error("Read past end of buffer")]
    OutOfRange,
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("{0} decoder not implemented")]
    NotImplemented(&'static str),
}

pub type Result<T> = std::result::Result<T, RidError>;

// ---------------------------------------------------------------------------
// Protocol / transport enums
// ---------------------------------------------------------------------------

/// Remote-ID protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ProtocolType {
    #[default]
    Unknown = 0,
    AstmF3411 = 1,
    AsdStan = 2,
    CnRid = 3,
}

/// Radio transport the frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TransportType {
    #[default]
    Unknown = 0,
    BtLegacy = 1,
    BtExtended = 2,
    WifiBeacon = 3,
    WifiNan = 4,
}

/// UAV identification type (Basic ID message, upper nibble of the type byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UavIdType {
    #[default]
    None = 0,
    SerialNumber = 1,
    CaaRegistration = 2,
    UtmAssigned = 3,
    SpecificSession = 4,
}

impl UavIdType {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => UavIdType::SerialNumber,
            2 => UavIdType::CaaRegistration,
            3 => UavIdType::UtmAssigned,
            4 => UavIdType::SpecificSession,
            _ => UavIdType::None,
        }
    }
}

/// Aircraft classification (Basic ID message, lower nibble of the type byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UavType {
    #[default]
    None = 0,
    Aeroplane = 1,
    HelicopterOrMultirotor = 2,
    Gyroplane = 3,
    HybridLift = 4,
    Ornithopter = 5,
    Glider = 6,
    Kite = 7,
    FreeBalloon = 8,
    CaptiveBalloon = 9,
    Airship = 10,
    FreeFallParachute = 11,
    Rocket = 12,
    TetheredPowered = 13,
    GroundObstacle = 14,
    Other = 15,
}

impl UavType {
    pub fn from_bits(v: u8) -> Self {
        match v & 0x0F {
            1 => UavType::Aeroplane,
            2 => UavType::HelicopterOrMultirotor,
            3 => UavType::Gyroplane,
            4 => UavType::HybridLift,
            5 => UavType::Ornithopter,
            6 => UavType::Glider,
            7 => UavType::Kite,
            8 => UavType::FreeBalloon,
            9 => UavType::CaptiveBalloon,
            10 => UavType::Airship,
            11 => UavType::FreeFallParachute,
            12 => UavType::Rocket,
            13 => UavType::TetheredPowered,
            14 => UavType::GroundObstacle,
            15 => UavType::Other,
            _ => UavType::None,
        }
    }
}

/// Where the operator location in a System message was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OperatorLocationType {
    #[default]
    Takeoff = 0,
    LiveGnss = 1,
    Fixed = 2,
}

impl OperatorLocationType {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => OperatorLocationType::LiveGnss,
            2 => OperatorLocationType::Fixed,
            _ => OperatorLocationType::Takeoff,
        }
    }
}

/// Reference surface for the reported height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HeightReference {
    #[default]
    Takeoff = 0,
    Ground = 1,
}

/// Horizontal position accuracy buckets from the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HorizontalAccuracy {
    #[default]
    Unknown = 0,
    LessThan10Nm = 1,
    LessThan4Nm = 2,
    LessThan2Nm = 3,
    LessThan1Nm = 4,
    LessThan0_5Nm = 5,
    LessThan0_3Nm = 6,
    LessThan0_1Nm = 7,
    LessThan0_05Nm = 8,
    LessThan30M = 9,
    LessThan10M = 10,
    LessThan3M = 11,
    LessThan1M = 12,
}

impl HorizontalAccuracy {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => HorizontalAccuracy::LessThan10Nm,
            2 => HorizontalAccuracy::LessThan4Nm,
            3 => HorizontalAccuracy::LessThan2Nm,
            4 => HorizontalAccuracy::LessThan1Nm,
            5 => HorizontalAccuracy::LessThan0_5Nm,
            6 => HorizontalAccuracy::LessThan0_3Nm,
            7 => HorizontalAccuracy::LessThan0_1Nm,
            8 => HorizontalAccuracy::LessThan0_05Nm,
            9 => HorizontalAccuracy::LessThan30M,
            10 => HorizontalAccuracy::LessThan10M,
            11 => HorizontalAccuracy::LessThan3M,
            12 => HorizontalAccuracy::LessThan1M,
            _ => HorizontalAccuracy::Unknown,
        }
    }
}

/// Vertical position accuracy buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum VerticalAccuracy {
    #[default]
    Unknown = 0,
    LessThan150M = 1,
    LessThan45M = 2,
    LessThan25M = 3,
    LessThan10M = 4,
    LessThan3M = 5,
    LessThan1M = 6,
}

impl VerticalAccuracy {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => VerticalAccuracy::LessThan150M,
            2 => VerticalAccuracy::LessThan45M,
            3 => VerticalAccuracy::LessThan25M,
            4 => VerticalAccuracy::LessThan10M,
            5 => VerticalAccuracy::LessThan3M,
            6 => VerticalAccuracy::LessThan1M,
            _ => VerticalAccuracy::Unknown,
        }
    }
}

/// Speed accuracy buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpeedAccuracy {
    #[default]
    Unknown = 0,
    LessThan10Mps = 1,
    LessThan3Mps = 2,
    LessThan1Mps = 3,
    LessThan0_3Mps = 4,
}

impl SpeedAccuracy {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => SpeedAccuracy::LessThan10Mps,
            2 => SpeedAccuracy::LessThan3Mps,
            3 => SpeedAccuracy::LessThan1Mps,
            4 => SpeedAccuracy::LessThan0_3Mps,
            _ => SpeedAccuracy::Unknown,
        }
    }
}

/// Declared flight status of the aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UavStatus {
    #[default]
    Undeclared = 0,
    Ground = 1,
    Airborne = 2,
    Emergency = 3,
    RemoteIdFailure = 4,
}

impl UavStatus {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => UavStatus::Ground,
            2 => UavStatus::Airborne,
            3 => UavStatus::Emergency,
            4 => UavStatus::RemoteIdFailure,
            _ => UavStatus::Undeclared,
        }
    }
}

// ---------------------------------------------------------------------------
// Input frame
// ---------------------------------------------------------------------------

/// A raw advertisement or beacon captured from the radio layer.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub payload: Vec<u8>,
    /// Received signal strength in dBm.
    pub rssi: i8,
    pub transport: TransportType,
    pub timestamp: Instant,
}

impl RawFrame {
    pub fn new(payload: Vec<u8>, rssi: i8, transport: TransportType) -> Self {
        RawFrame {
            payload,
            rssi,
            transport,
            timestamp: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message payload parts
// ---------------------------------------------------------------------------

/// Decoded Location/Vector message fields.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub valid: bool,
    /// Degrees, -90 to 90.
    pub latitude: f64,
    /// Degrees, -180 to 180.
    pub longitude: f64,
    /// Barometric altitude (meters).
    pub altitude_baro: f32,
    /// Geodetic altitude (meters).
    pub altitude_geo: f32,
    /// Height above the reference surface (meters).
    pub height: f32,
    pub height_ref: HeightReference,
    /// m/s. NaN when the wire value is the "unavailable" sentinel.
    pub speed_horizontal: f32,
    /// m/s, positive is up. NaN when unavailable.
    pub speed_vertical: f32,
    /// Track direction in degrees, 0-360. NaN when unavailable.
    pub direction: f32,
    pub h_accuracy: HorizontalAccuracy,
    pub v_accuracy: VerticalAccuracy,
    pub speed_accuracy: SpeedAccuracy,
    pub status: UavStatus,
    /// Offset from the top of the hour, 0.1-second units.
    pub timestamp_offset: u16,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            valid: false,
            latitude: 0.0,
            longitude: 0.0,
            altitude_baro: 0.0,
            altitude_geo: 0.0,
            height: 0.0,
            height_ref: HeightReference::Takeoff,
            speed_horizontal: 0.0,
            speed_vertical: 0.0,
            direction: 0.0,
            h_accuracy: HorizontalAccuracy::Unknown,
            v_accuracy: VerticalAccuracy::Unknown,
            speed_accuracy: SpeedAccuracy::Unknown,
            status: UavStatus::Undeclared,
            timestamp_offset: 0,
        }
    }
}

/// Decoded System message fields (operator / operating-area info).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemInfo {
    pub valid: bool,
    pub location_type: OperatorLocationType,
    pub operator_latitude: f64,
    pub operator_longitude: f64,
    /// Operation ceiling (meters).
    pub area_ceiling: f32,
    /// Operation floor (meters).
    pub area_floor: f32,
    /// Number of aircraft in the operating area.
    pub area_count: u16,
    /// Operating-area radius (meters).
    pub area_radius: u16,
    /// Absolute Unix timestamp.
    pub timestamp: u32,
}

/// Decoded Self-ID message (free-form flight description).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelfId {
    pub valid: bool,
    pub description_type: u8,
    pub description: String,
}

/// Decoded Operator-ID message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperatorId {
    pub valid: bool,
    pub id_type: u8,
    pub id: String,
}

// ---------------------------------------------------------------------------
// Aircraft record
// ---------------------------------------------------------------------------

/// Merged state of one observed aircraft.
///
/// Built up across messages: each message type fills its own part, and the
/// session registry accumulates parts until the record times out.
#[derive(Debug, Clone, Serialize)]
pub struct Uav {
    /// Primary ID (serial number or registration), trimmed of padding.
    pub id: String,
    pub id_type: UavIdType,
    pub uav_type: UavType,

    pub protocol: ProtocolType,
    pub transport: TransportType,

    /// Signal strength of the most recent frame (dBm).
    pub rssi: i8,
    #[serde(skip)]
    pub last_seen: Instant,

    pub location: Location,
    pub system: SystemInfo,
    pub self_id: SelfId,
    pub operator_id: OperatorId,

    /// Raw authentication pages; interpretation depends on the auth type.
    pub auth_data: Vec<u8>,

    /// Number of messages folded into this record.
    pub message_count: u32,
}

impl Uav {
    pub fn new() -> Self {
        Uav {
            id: String::new(),
            id_type: UavIdType::None,
            uav_type: UavType::None,
            protocol: ProtocolType::Unknown,
            transport: TransportType::Unknown,
            rssi: 0,
            last_seen: Instant::now(),
            location: Location::default(),
            system: SystemInfo::default(),
            self_id: SelfId::default(),
            operator_id: OperatorId::default(),
            auth_data: Vec::new(),
            message_count: 0,
        }
    }
}

impl Default for Uav {
    fn default() -> Self {
        Uav::new()
    }
}

/// Result of feeding one frame through the protocol router.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub success: bool,
    /// True if some enabled decoder recognized the frame as Remote ID,
    /// even when the decode itself subsequently failed.
    pub is_remote_id: bool,
    pub protocol: ProtocolType,
    pub error: Option<RidError>,
    /// Decoded aircraft data. Valid only when `success` is true.
    pub uav: Option<Uav>,
}

impl ParseResult {
    pub(crate) fn failure(error: RidError) -> Self {
        ParseResult {
            success: false,
            is_remote_id: false,
            protocol: ProtocolType::Unknown,
            error: Some(error),
            uav: None,
        }
    }
}

// ---------------------------------------------------------------------------
// String / hex utilities
// ---------------------------------------------------------------------------

/// Extract a fixed-width wire string field, trimming trailing NUL and space
/// padding and stopping at an embedded NUL as a C string would.
pub fn trim_wire_string(data: &[u8]) -> String {
    let end = data
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |p| p + 1);
    let field = &data[..end];
    let nul = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..nul]).into_owned()
}

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if !hex.len().is_multiple_of(2) {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uav_type_from_bits() {
        assert_eq!(UavType::from_bits(2), UavType::HelicopterOrMultirotor);
        assert_eq!(UavType::from_bits(15), UavType::Other);
        assert_eq!(UavType::from_bits(0), UavType::None);
        // Only the low nibble matters
        assert_eq!(UavType::from_bits(0x12), UavType::HelicopterOrMultirotor);
    }

    #[test]
    fn test_id_type_from_bits() {
        assert_eq!(UavIdType::from_bits(1), UavIdType::SerialNumber);
        assert_eq!(UavIdType::from_bits(4), UavIdType::SpecificSession);
        assert_eq!(UavIdType::from_bits(9), UavIdType::None);
    }

    #[test]
    fn test_status_from_bits_out_of_range() {
        assert_eq!(UavStatus::from_bits(7), UavStatus::Undeclared);
    }

    #[test]
    fn test_trim_wire_string() {
        assert_eq!(trim_wire_string(b"DJI123\0\0\0\0"), "DJI123");
        assert_eq!(trim_wire_string(b"ABC   "), "ABC");
        assert_eq!(trim_wire_string(b"\0\0\0"), "");
        assert_eq!(trim_wire_string(b"A B"), "A B");
        assert_eq!(trim_wire_string(b"AB\0CD"), "AB");
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(hex_decode("1E16FAFF"), Some(vec![0x1E, 0x16, 0xFA, 0xFF]));
        assert_eq!(hex_decode("odd"), None); // odd length
        assert_eq!(hex_decode("ZZZZ"), None); // invalid chars
    }

    #[test]
    fn test_hex_roundtrip() {
        let bytes = vec![0x00, 0x7F, 0xFF, 0x16];
        assert_eq!(hex_decode(&hex_encode(&bytes)), Some(bytes));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(RidError::EmptyPayload.to_string(), "Empty payload");
        assert_eq!(
            RidError::NoProtocolMatch.to_string(),
            "No matching protocol decoder"
        );
    }
}
