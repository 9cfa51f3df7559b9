//! Reserved decoder slot for the Chinese GB/T Remote ID standard.
//!
//! The GB/T bitstream is not publicly specified, so this decoder never
//! claims a frame: `is_remote_id` is constitutively false and `decode`
//! reports `NotImplemented`. The router keeps its dispatch branch so the
//! protocol can be slotted in without touching callers.

use crate::types::*;

#[derive(Debug, Default)]
pub struct CnRidDecoder;

impl CnRidDecoder {
    /// Always false: without a published bitstream there is nothing to probe.
    pub fn is_remote_id(&self, _payload: &[u8]) -> bool {
        false
    }

    pub fn decode(&self, _payload: &[u8], uav: &mut Uav) -> Result<()> {
        uav.protocol = ProtocolType::CnRid;
        Err(RidError::NotImplemented("GB/T"))
    }

    /// Operator-ID validation is pending the official format specification.
    pub fn validate_cn_operator_id(&self, operator_id: &str) -> bool {
        if operator_id.len() < 6 {
            return false;
        }
        false
    }

    pub fn is_implemented(&self) -> bool {
        false
    }
}
