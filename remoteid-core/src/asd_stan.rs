//! ASD-STAN EN 4709-002 overlay on the ASTM decoder.
//!
//! The EU standard shares the ASTM wire grammar; this layer re-tags the
//! protocol, validates the EU operator-ID format, and parses the EU
//! extension bits that live in the reserved tail of the System message.

use serde::Serialize;
use tracing::debug;

use crate::astm::{AstmDecoder, MessageType, MESSAGE_SIZE};
use crate::types::*;

/// ISO 3166-1 alpha-3 codes accepted in EU operator IDs
/// (EU members, EEA/EFTA, and the UK).
pub const EU_COUNTRY_CODES: [&str; 32] = [
    "AUT", "BEL", "BGR", "HRV", "CYP", "CZE", "DNK", "EST", "FIN", "FRA", "DEU", "GRC", "HUN",
    "IRL", "ITA", "LVA", "LTU", "LUX", "MLT", "NLD", "POL", "PRT", "ROU", "SVK", "SVN", "ESP",
    "SWE", "ISL", "LIE", "NOR", "CHE", "GBR",
];

/// EU operation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EuClassification {
    #[default]
    Undefined = 0,
    Open = 1,
    Specific = 2,
    Certified = 3,
}

impl EuClassification {
    fn from_bits(v: u8) -> Self {
        match v {
            1 => EuClassification::Open,
            2 => EuClassification::Specific,
            3 => EuClassification::Certified,
            _ => EuClassification::Undefined,
        }
    }
}

/// EU class mark for the Open category (C0-C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EuCategoryClass {
    #[default]
    Undefined = 0,
    C0 = 1,
    C1 = 2,
    C2 = 3,
    C3 = 4,
    C4 = 5,
    C5 = 6,
    C6 = 7,
}

impl EuCategoryClass {
    fn from_bits(v: u8) -> Self {
        match v {
            1 => EuCategoryClass::C0,
            2 => EuCategoryClass::C1,
            3 => EuCategoryClass::C2,
            4 => EuCategoryClass::C3,
            5 => EuCategoryClass::C4,
            6 => EuCategoryClass::C5,
            7 => EuCategoryClass::C6,
            _ => EuCategoryClass::Undefined,
        }
    }
}

/// EU-specific System-message extension fields.
///
/// These bits sit in bytes the base standard keeps reserved, so their
/// validity is tracked independently of the System part itself.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EuSystemInfo {
    pub valid: bool,
    pub classification: EuClassification,
    pub category_class: EuCategoryClass,
    pub geo_awareness: bool,
    pub remote_pilot_id: bool,
}

/// Result of an ASD-STAN decode: the base message type plus any EU extras.
#[derive(Debug, Clone)]
pub struct AsdDecodeResult {
    pub message_type: MessageType,
    pub eu_info: EuSystemInfo,
}

/// Decoder for the EU flavor of broadcast Remote ID.
#[derive(Debug, Default)]
pub struct AsdStanDecoder {
    astm: AstmDecoder,
}

impl AsdStanDecoder {
    /// Same framing as ASTM F3411.
    pub fn is_remote_id(&self, payload: &[u8]) -> bool {
        self.astm.is_remote_id(payload)
    }

    /// Decode a complete advertisement payload, re-tagged as ASD-STAN.
    ///
    /// The payload is located once; message decoding and the EU-extension
    /// parse are delegated to `decode_message`.
    pub fn decode(&self, payload: &[u8], uav: &mut Uav) -> Result<AsdDecodeResult> {
        let (msg, transport) =
            crate::astm::locate_message(payload).ok_or(RidError::NoProtocolMatch)?;
        let result = self.decode_message(msg, uav)?;
        uav.transport = transport;

        if uav.operator_id.valid
            && !uav.operator_id.id.is_empty()
            && !self.validate_eu_operator_id(&uav.operator_id.id)
        {
            // Not fatal: some aircraft broadcast ASTM-format IDs in EU airspace
            debug!(operator_id = %uav.operator_id.id, "operator ID is not in EU format");
        }

        Ok(result)
    }

    /// Decode a single 25-byte message, parsing EU extensions for System
    /// messages.
    pub fn decode_message(&self, data: &[u8], uav: &mut Uav) -> Result<AsdDecodeResult> {
        let message_type = self.astm.decode_message(data, uav)?;
        uav.protocol = ProtocolType::AsdStan;

        let eu_info = if message_type == MessageType::System && data.len() >= MESSAGE_SIZE {
            parse_eu_extensions(data)
        } else {
            EuSystemInfo::default()
        };

        Ok(AsdDecodeResult {
            message_type,
            eu_info,
        })
    }

    /// Validate an EU operator ID.
    ///
    /// Accepted forms:
    /// - dashed: `CCC-XX-NNNN…` (at least 7 chars, with a second dash)
    /// - compact: `CCCNNNNN…` (alphanumeric after the country code)
    pub fn validate_eu_operator_id(&self, operator_id: &str) -> bool {
        if operator_id.len() < 5 {
            return false;
        }

        let Some(_country) = self.extract_country_code(operator_id) else {
            return false;
        };

        let bytes = operator_id.as_bytes();
        if bytes.len() > 3 && bytes[3] == b'-' {
            if operator_id.len() < 7 {
                return false;
            }
            // Need a second separator with a registration number behind it
            match operator_id[4..].find('-') {
                Some(pos) => 4 + pos + 1 < operator_id.len(),
                None => false,
            }
        } else {
            operator_id[3..].bytes().all(|c| c.is_ascii_alphanumeric())
        }
    }

    /// Extract the leading ISO-3166 alpha-3 country code, if valid.
    pub fn extract_country_code<'a>(&self, operator_id: &'a str) -> Option<&'a str> {
        if operator_id.len() < 3 {
            return None;
        }
        let code = &operator_id[..3];
        if !code.bytes().all(|c| c.is_ascii_uppercase()) {
            return None;
        }
        EU_COUNTRY_CODES.contains(&code).then_some(code)
    }
}

/// Parse the EU extension bits from a System message.
///
/// Byte 21: classification (bits 7-6), category class (bits 5-3).
/// Byte 22: geo-awareness (bit 0), remote-pilot-ID-present (bit 1).
/// The layout is provisional; callers must check `valid` on the result.
fn parse_eu_extensions(msg: &[u8]) -> EuSystemInfo {
    if msg.len() < MESSAGE_SIZE {
        return EuSystemInfo::default();
    }

    let class_byte = msg[21];
    let flags = msg[22];
    EuSystemInfo {
        valid: true,
        classification: EuClassification::from_bits((class_byte >> 6) & 0x03),
        category_class: EuCategoryClass::from_bits((class_byte >> 3) & 0x07),
        geo_awareness: flags & 0x01 != 0,
        remote_pilot_id: flags & 0x02 != 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
