//! Wi-Fi framing dissector: locates ODID bytes inside 802.11 frames.
//!
//! Three containers are supported:
//! - Beacon / probe-response / action management frames carrying a
//!   vendor-specific IE with the ASTM OUI
//! - NAN service-discovery frames carrying the Remote ID service hash
//! - Raw vendor-IE payloads (OUI + vendor type + message)
//!
//! The actual 25-byte messages are handed to the ASTM decoder.

use crate::astm::{AstmDecoder, MESSAGE_SIZE};
use crate::bits::read_le16;
use crate::types::*;

/// ASTM-designated OUI for Remote ID vendor IEs.
pub const WIFI_OUI: [u8; 3] = [0xFA, 0x0B, 0xBC];
/// Remote ID vendor-specific type byte, following the OUI.
pub const WIFI_VENDOR_TYPE: u8 = 0x0D;
/// NAN service ID: SHA-256 prefix of "org.opendroneid.remoteid".
pub const NAN_SERVICE_ID: [u8; 6] = [0x88, 0x69, 0x19, 0x9D, 0x92, 0x09];

// 802.11 frame control bits
const FC_TYPE_MASK: u16 = 0x000C;
const FC_SUBTYPE_MASK: u16 = 0x00F0;
const FC_TYPE_MGMT: u16 = 0x0000;
const FC_SUBTYPE_BEACON: u16 = 0x0080;
const FC_SUBTYPE_PROBE_RESP: u16 = 0x0050;
const FC_SUBTYPE_ACTION: u16 = 0x00D0;

const IE_VENDOR_SPECIFIC: u8 = 221;

/// 802.11 management frame header size.
const MIN_MGMT_HEADER: usize = 24;
/// Fixed beacon body: timestamp(8) + interval(2) + capability(2).
const MIN_BEACON_BODY: usize = 12;

/// Dissector for Wi-Fi–carried Remote ID.
#[derive(Debug, Default)]
pub struct WifiDecoder {
    astm: AstmDecoder,
}

impl WifiDecoder {
    /// Cheap probe: does the payload contain the ASTM OUI prefix or the NAN
    /// Remote ID service hash anywhere?
    pub fn is_remote_id(&self, payload: &[u8]) -> bool {
        if payload.len() < 10 {
            return false;
        }
        let oui_prefix = [WIFI_OUI[0], WIFI_OUI[1], WIFI_OUI[2], WIFI_VENDOR_TYPE];
        payload.windows(4).any(|w| w == oui_prefix)
            || payload.windows(6).any(|w| w == NAN_SERVICE_ID)
    }

    /// Decode an 802.11 management frame (beacon, probe response, action)
    /// whose body carries a Remote ID vendor IE.
    pub fn decode_beacon(&self, payload: &[u8], uav: &mut Uav) -> Result<()> {
        if payload.len() < MIN_MGMT_HEADER + MIN_BEACON_BODY {
            return Err(RidError::Truncated {
                expected: MIN_MGMT_HEADER + MIN_BEACON_BODY,
                actual: payload.len(),
            });
        }

        let body_offset = parse_frame_header(payload)?;
        // Skip fixed beacon parameters
        let ies = &payload[body_offset + MIN_BEACON_BODY..];

        let ie_data = find_vendor_ie(ies, &WIFI_OUI).ok_or(RidError::NoProtocolMatch)?;
        if ie_data.len() < 2 {
            return Err(RidError::FramingUnderflow);
        }

        // Skip the vendor type byte
        self.decode_astm_payload(&ie_data[1..], uav)?;
        uav.transport = TransportType::WifiBeacon;
        uav.protocol = ProtocolType::AstmF3411;
        Ok(())
    }

    /// Decode a NAN service-discovery frame. Falls back to a raw OUI scan
    /// when the service ID is not present.
    pub fn decode_nan(&self, payload: &[u8], uav: &mut Uav) -> Result<()> {
        if payload.len() < 10 {
            return Err(RidError::Truncated {
                expected: 10,
                actual: payload.len(),
            });
        }

        // Service ID immediately followed by the ASTM message
        let mut i = 0;
        while i + NAN_SERVICE_ID.len() + MESSAGE_SIZE <= payload.len() {
            if payload[i..i + NAN_SERVICE_ID.len()] == NAN_SERVICE_ID {
                let start = i + NAN_SERVICE_ID.len();
                if self.decode_astm_payload(&payload[start..], uav).is_ok() {
                    uav.transport = TransportType::WifiNan;
                    uav.protocol = ProtocolType::AstmF3411;
                    return Ok(());
                }
            }
            i += 1;
        }

        // Raw OUI + vendor type prefix
        let oui_prefix = [WIFI_OUI[0], WIFI_OUI[1], WIFI_OUI[2], WIFI_VENDOR_TYPE];
        let mut i = 0;
        while i + oui_prefix.len() + MESSAGE_SIZE <= payload.len() {
            if payload[i..i + oui_prefix.len()] == oui_prefix {
                let start = i + oui_prefix.len();
                if self.decode_astm_payload(&payload[start..], uav).is_ok() {
                    uav.transport = TransportType::WifiNan;
                    uav.protocol = ProtocolType::AstmF3411;
                    return Ok(());
                }
            }
            i += 1;
        }

        Err(RidError::NoProtocolMatch)
    }

    /// Decode a bare vendor-IE payload: OUI, vendor type, then the message.
    pub fn decode_vendor_ie(&self, payload: &[u8], uav: &mut Uav) -> Result<()> {
        if payload.len() < 4 {
            return Err(RidError::Truncated {
                expected: 4,
                actual: payload.len(),
            });
        }
        if payload[..3] != WIFI_OUI || payload[3] != WIFI_VENDOR_TYPE {
            return Err(RidError::NoProtocolMatch);
        }

        self.decode_astm_payload(&payload[4..], uav)?;
        uav.transport = TransportType::WifiBeacon;
        uav.protocol = ProtocolType::AstmF3411;
        Ok(())
    }

    fn decode_astm_payload(&self, data: &[u8], uav: &mut Uav) -> Result<()> {
        if data.len() < MESSAGE_SIZE {
            return Err(RidError::Truncated {
                expected: MESSAGE_SIZE,
                actual: data.len(),
            });
        }
        self.astm.decode_message(data, uav)?;
        Ok(())
    }
}

/// Validate the 802.11 management header and return the body offset.
fn parse_frame_header(data: &[u8]) -> Result<usize> {
    if data.len() < MIN_MGMT_HEADER {
        return Err(RidError::FramingUnderflow);
    }

    let fc = read_le16(data);
    if fc & FC_TYPE_MASK != FC_TYPE_MGMT {
        return Err(RidError::FramingUnderflow);
    }

    let subtype = fc & FC_SUBTYPE_MASK;
    if subtype != FC_SUBTYPE_BEACON
        && subtype != FC_SUBTYPE_PROBE_RESP
        && subtype != FC_SUBTYPE_ACTION
    {
        return Err(RidError::FramingUnderflow);
    }

    Ok(MIN_MGMT_HEADER)
}

/// Walk `[id][len][data]` information elements looking for a vendor-specific
/// IE whose data starts with `oui`. Returns the IE data after the OUI.
fn find_vendor_ie<'a>(data: &'a [u8], oui: &[u8; 3]) -> Option<&'a [u8]> {
    let mut offset = 0usize;
    while offset + 2 <= data.len() {
        let ie_id = data[offset];
        let ie_len = data[offset + 1] as usize;
        if offset + 2 + ie_len > data.len() {
            break;
        }

        if ie_id == IE_VENDOR_SPECIFIC && ie_len >= oui.len() {
            let ie = &data[offset + 2..offset + 2 + ie_len];
            if &ie[..3] == oui {
                return Some(&ie[3..]);
            }
        }

        offset += 2 + ie_len;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
