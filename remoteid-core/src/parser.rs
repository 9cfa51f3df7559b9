//! Protocol router: detects the protocol family of a raw frame, dispatches
//! to the matching decoder, and merges successful decodes into the session
//! registry.
//!
//! Dispatch order is fixed: ASTM (Bluetooth framing), then Wi-Fi carriage of
//! ASTM, then ASD-STAN, then the reserved CN-RID slot. Each candidate is
//! gated by a config flag and by its cheap `is_remote_id` probe before the
//! full decoder runs.

use std::time::Instant;

use tracing::debug;

use crate::asd_stan::AsdStanDecoder;
use crate::astm::AstmDecoder;
use crate::cn_rid::CnRidDecoder;
use crate::session::{SessionManager, UavCallback};
use crate::types::*;
use crate::wifi::WifiDecoder;

/// Router configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Evict aircraft after this long without a frame.
    pub uav_timeout_ms: u32,
    /// Merge decodes into the session registry by aircraft ID.
    pub enable_deduplication: bool,
    pub enable_astm: bool,
    pub enable_asd: bool,
    pub enable_cn: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            uav_timeout_ms: 30_000,
            enable_deduplication: true,
            enable_astm: true,
            enable_asd: false,
            enable_cn: false,
        }
    }
}

/// The decode-and-track pipeline entry point.
///
/// Single-writer by construction: `parse` and the registry mutators take
/// `&mut self`. Wrap the parser in a lock for cross-thread use; independent
/// parser instances share nothing.
pub struct RemoteIdParser {
    config: ParserConfig,
    session: SessionManager,
    astm: AstmDecoder,
    wifi: WifiDecoder,
    asd: AsdStanDecoder,
    cn: CnRidDecoder,
}

impl RemoteIdParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        let session = SessionManager::new(config.uav_timeout_ms);
        RemoteIdParser {
            config,
            session,
            astm: AstmDecoder,
            wifi: WifiDecoder::default(),
            asd: AsdStanDecoder::default(),
            cn: CnRidDecoder,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one captured frame.
    pub fn parse(&mut self, frame: &RawFrame) -> ParseResult {
        self.parse_at(&frame.payload, frame.rssi, frame.transport, frame.timestamp)
    }

    /// Parse raw payload bytes stamped with the current time.
    pub fn parse_bytes(
        &mut self,
        payload: &[u8],
        rssi: i8,
        transport: TransportType,
    ) -> ParseResult {
        self.parse_at(payload, rssi, transport, Instant::now())
    }

    /// Parse against an explicit capture clock.
    pub fn parse_at(
        &mut self,
        payload: &[u8],
        rssi: i8,
        transport: TransportType,
        timestamp: Instant,
    ) -> ParseResult {
        if payload.is_empty() {
            return ParseResult::failure(RidError::EmptyPayload);
        }

        let stamp = |uav: &mut Uav| {
            uav.transport = transport;
            uav.rssi = rssi;
            uav.last_seen = timestamp;
        };

        // ASTM F3411 over Bluetooth framing
        if self.config.enable_astm && self.astm.is_remote_id(payload) {
            let mut uav = Uav::new();
            stamp(&mut uav);

            return match self.astm.decode(payload, &mut uav) {
                Ok(_) => self.finish(ProtocolType::AstmF3411, uav),
                Err(e) => Self::recognized_failure(e),
            };
        }

        // ASTM F3411 carried over Wi-Fi
        if self.config.enable_astm && self.wifi.is_remote_id(payload) {
            let mut uav = Uav::new();
            stamp(&mut uav);

            let decoded = if transport == TransportType::WifiNan {
                self.wifi.decode_nan(payload, &mut uav)
            } else {
                self.wifi
                    .decode_beacon(payload, &mut uav)
                    .or_else(|_| self.wifi.decode_nan(payload, &mut uav))
            };

            return match decoded {
                Ok(()) => {
                    let protocol = uav.protocol;
                    self.finish(protocol, uav)
                }
                Err(e) => Self::recognized_failure(e),
            };
        }

        // ASD-STAN shares the ASTM framing, so it only claims a frame when
        // the ASTM path is disabled
        if self.config.enable_asd && self.asd.is_remote_id(payload) {
            let mut uav = Uav::new();
            stamp(&mut uav);

            return match self.asd.decode(payload, &mut uav) {
                Ok(_) => self.finish(ProtocolType::AsdStan, uav),
                Err(e) => Self::recognized_failure(e),
            };
        }

        // Reserved CN-RID slot: never claims a frame today
        if self.config.enable_cn && self.cn.is_remote_id(payload) {
            let mut uav = Uav::new();
            stamp(&mut uav);

            return match self.cn.decode(payload, &mut uav) {
                Ok(()) => self.finish(ProtocolType::CnRid, uav),
                Err(e) => Self::recognized_failure(e),
            };
        }

        debug!(len = payload.len(), "frame matched no enabled decoder");
        ParseResult::failure(RidError::NoProtocolMatch)
    }

    /// Merge a successful decode into the registry and build the result.
    fn finish(&mut self, protocol: ProtocolType, uav: Uav) -> ParseResult {
        if self.config.enable_deduplication && !uav.id.is_empty() {
            self.session.update(uav.clone());
        }
        ParseResult {
            success: true,
            is_remote_id: true,
            protocol,
            error: None,
            uav: Some(uav),
        }
    }

    fn recognized_failure(error: RidError) -> ParseResult {
        ParseResult {
            success: false,
            is_remote_id: true,
            protocol: ProtocolType::Unknown,
            error: Some(error),
            uav: None,
        }
    }

    // -- Registry facade --

    /// Snapshot of tracked aircraft, most recently seen first.
    pub fn active_uavs(&self) -> Vec<Uav> {
        self.session.active_uavs()
    }

    /// Borrow a tracked aircraft. The borrow must not outlive the next
    /// mutating call.
    pub fn get_uav(&self, id: &str) -> Option<&Uav> {
        self.session.get(id)
    }

    pub fn active_count(&self) -> usize {
        self.session.count()
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Evict timed-out aircraft; returns the evicted IDs.
    pub fn cleanup(&mut self) -> Vec<String> {
        self.session.cleanup()
    }

    /// Eviction against an explicit clock.
    pub fn cleanup_at(&mut self, now: Instant) -> Vec<String> {
        self.session.cleanup_at(now)
    }

    pub fn set_on_new_uav(&mut self, callback: UavCallback) {
        self.session.set_on_new_uav(callback);
    }

    pub fn set_on_uav_update(&mut self, callback: UavCallback) {
        self.session.set_on_uav_update(callback);
    }

    pub fn set_on_uav_timeout(&mut self, callback: UavCallback) {
        self.session.set_on_uav_timeout(callback);
    }
}

impl Default for RemoteIdParser {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astm::MESSAGE_SIZE;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// The canonical Basic ID advertisement: serial "DJI1234567890ABCD",
    /// multirotor, wrapped in a legacy BLE service-data structure.
    fn dji_basic_id_frame() -> Vec<u8> {
        let mut payload = vec![0x1E, 0x16, 0xFA, 0xFF, 0x00, 0x02, 0x12];
        payload.extend_from_slice(b"DJI1234567890ABCD");
        payload.extend_from_slice(&[0x00; 6]);
        assert_eq!(payload.len(), 31);
        payload
    }

    fn location_frame(lat: f64, lon: f64, alt_m: f32) -> Vec<u8> {
        let mut msg = [0u8; MESSAGE_SIZE];
        msg[0] = 0x12;
        msg[1] = 0x20;
        msg[2] = 45;
        msg[3] = 40;
        msg[5..9].copy_from_slice(&((lat * 1e7) as i32).to_le_bytes());
        msg[9..13].copy_from_slice(&((lon * 1e7) as i32).to_le_bytes());
        let alt = ((alt_m + 1000.0) / 0.5) as u16;
        msg[13..15].copy_from_slice(&alt.to_le_bytes());
        msg[15..17].copy_from_slice(&alt.to_le_bytes());

        let mut payload = vec![(MESSAGE_SIZE + 4) as u8, 0x16, 0xFA, 0xFF, 0x00];
        payload.extend_from_slice(&msg);
        payload
    }

    #[test]
    fn test_ble_basic_id_end_to_end() {
        let mut parser = RemoteIdParser::new();
        let result = parser.parse_bytes(&dji_basic_id_frame(), -65, TransportType::BtLegacy);

        assert!(result.success);
        assert!(result.is_remote_id);
        assert_eq!(result.protocol, ProtocolType::AstmF3411);

        let uav = result.uav.unwrap();
        assert_eq!(uav.id, "DJI1234567890ABCD");
        assert_eq!(uav.id_type, UavIdType::SerialNumber);
        assert_eq!(uav.uav_type, UavType::HelicopterOrMultirotor);
        assert_eq!(uav.rssi, -65);
        assert_eq!(parser.active_count(), 1);
    }

    #[test]
    fn test_location_decode_end_to_end() {
        let mut parser = RemoteIdParser::new();
        let result =
            parser.parse_bytes(&location_frame(37.7749, -122.4194, 100.0), -70, TransportType::BtLegacy);

        assert!(result.success);
        let uav = result.uav.unwrap();
        assert!(uav.location.valid);
        assert!((uav.location.latitude - 37.7749).abs() < 1e-5);
        assert!((uav.location.longitude + 122.4194).abs() < 1e-5);
        assert!((uav.location.altitude_geo - 100.0).abs() < 0.5);
        // No Basic ID yet, so nothing entered the registry
        assert_eq!(parser.active_count(), 0);
    }

    #[test]
    fn test_duplicate_frame_counts_once() {
        let new_count = Rc::new(RefCell::new(0));
        let update_count = Rc::new(RefCell::new(0));

        let mut parser = RemoteIdParser::new();
        let n = Rc::clone(&new_count);
        parser.set_on_new_uav(Box::new(move |_| *n.borrow_mut() += 1));
        let u = Rc::clone(&update_count);
        parser.set_on_uav_update(Box::new(move |_| *u.borrow_mut() += 1));

        let frame = dji_basic_id_frame();
        assert!(parser.parse_bytes(&frame, -65, TransportType::BtLegacy).success);
        assert!(parser.parse_bytes(&frame, -64, TransportType::BtLegacy).success);

        assert_eq!(parser.active_count(), 1);
        assert_eq!(
            parser.get_uav("DJI1234567890ABCD").unwrap().message_count,
            2
        );
        assert_eq!(*new_count.borrow(), 1);
        assert_eq!(*update_count.borrow(), 1);
    }

    #[test]
    fn test_timeout_eviction() {
        let timeout_count = Rc::new(RefCell::new(0));
        let mut parser = RemoteIdParser::with_config(ParserConfig {
            uav_timeout_ms: 100,
            ..ParserConfig::default()
        });
        let t = Rc::clone(&timeout_count);
        parser.set_on_uav_timeout(Box::new(move |_| *t.borrow_mut() += 1));

        let t0 = Instant::now();
        parser.parse_at(&dji_basic_id_frame(), -65, TransportType::BtLegacy, t0);
        assert_eq!(parser.active_count(), 1);

        let removed = parser.cleanup_at(t0 + Duration::from_millis(150));
        assert_eq!(removed, vec!["DJI1234567890ABCD".to_string()]);
        assert_eq!(*timeout_count.borrow(), 1);
        assert_eq!(parser.active_count(), 0);
    }

    #[test]
    fn test_empty_payload() {
        let mut parser = RemoteIdParser::new();
        let result = parser.parse_bytes(&[], -60, TransportType::BtLegacy);

        assert!(!result.success);
        assert!(!result.is_remote_id);
        assert_eq!(result.error.unwrap().to_string(), "Empty payload");
        assert_eq!(parser.active_count(), 0);
    }

    #[test]
    fn test_unrecognized_frame() {
        let mut parser = RemoteIdParser::new();
        // Plausible BLE advertisement, but not Remote ID
        let result = parser.parse_bytes(
            &[0x02, 0x01, 0x06, 0x03, 0x03, 0xAA, 0xFE],
            -60,
            TransportType::BtLegacy,
        );

        assert!(!result.success);
        assert!(!result.is_remote_id);
        assert_eq!(result.error, Some(RidError::NoProtocolMatch));
    }

    #[test]
    fn test_recognized_but_malformed() {
        let mut parser = RemoteIdParser::new();
        // Valid ODID wrapper, truncated message
        let mut payload = vec![10, 0x16, 0xFA, 0xFF, 0x00];
        payload.extend_from_slice(&[0x02; 6]);

        let result = parser.parse_bytes(&payload, -60, TransportType::BtLegacy);
        assert!(!result.success);
        assert!(result.is_remote_id);
        assert!(matches!(result.error, Some(RidError::Truncated { .. })));
        assert_eq!(parser.active_count(), 0);
    }

    #[test]
    fn test_failed_decode_does_not_mutate_registry() {
        let mut parser = RemoteIdParser::new();
        parser.parse_bytes(&dji_basic_id_frame(), -65, TransportType::BtLegacy);

        let mut truncated = vec![10, 0x16, 0xFA, 0xFF, 0x00];
        truncated.extend_from_slice(&[0x02; 6]);
        parser.parse_bytes(&truncated, -60, TransportType::BtLegacy);

        assert_eq!(parser.active_count(), 1);
        assert_eq!(
            parser.get_uav("DJI1234567890ABCD").unwrap().message_count,
            1
        );
    }

    #[test]
    fn test_active_ordering_after_interleaved_parses() {
        let mut parser = RemoteIdParser::new();
        let t0 = Instant::now();

        let frame_for = |id: &str| {
            let mut msg = [0u8; MESSAGE_SIZE];
            msg[0] = 0x02;
            msg[1] = 0x12;
            msg[2..2 + id.len()].copy_from_slice(id.as_bytes());
            let mut payload = vec![(MESSAGE_SIZE + 4) as u8, 0x16, 0xFA, 0xFF, 0x00];
            payload.extend_from_slice(&msg);
            payload
        };

        for (id, ms) in [("A", 0u64), ("B", 10), ("A", 20), ("C", 30)] {
            parser.parse_at(
                &frame_for(id),
                -60,
                TransportType::BtLegacy,
                t0 + Duration::from_millis(ms),
            );
        }

        let ids: Vec<String> = parser.active_uavs().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_merge_accumulates_parts() {
        let mut parser = RemoteIdParser::new();
        parser.parse_bytes(&dji_basic_id_frame(), -65, TransportType::BtLegacy);

        // Location-only frame for a different "aircraft" has no id, so it
        // cannot merge; send a pack carrying both id and location instead
        let mut pack = vec![0xF2, ((MESSAGE_SIZE as u8 - 1) << 4) | 2];
        let mut basic = [0u8; MESSAGE_SIZE];
        basic[0] = 0x02;
        basic[1] = 0x12;
        basic[2..19].copy_from_slice(b"DJI1234567890ABCD");
        pack.extend_from_slice(&basic);
        let mut loc = [0u8; MESSAGE_SIZE];
        loc[0] = 0x12;
        loc[5..9].copy_from_slice(&((51.5e7) as i32).to_le_bytes());
        pack.extend_from_slice(&loc);

        let mut payload = vec![(pack.len() + 4) as u8, 0x16, 0xFA, 0xFF, 0x00];
        payload.extend_from_slice(&pack);

        let result = parser.parse_bytes(&payload, -63, TransportType::BtLegacy);
        assert!(result.success);

        let stored = parser.get_uav("DJI1234567890ABCD").unwrap();
        assert!(stored.location.valid);
        assert_eq!(stored.message_count, 2); // 1 insert + 1 merge
        assert_eq!(stored.rssi, -63);
    }

    #[test]
    fn test_asd_disabled_by_default() {
        let parser = RemoteIdParser::new();
        assert!(!parser.config().enable_asd);
        assert!(!parser.config().enable_cn);
    }

    #[test]
    fn test_asd_claims_frame_when_astm_disabled() {
        let mut parser = RemoteIdParser::with_config(ParserConfig {
            enable_astm: false,
            enable_asd: true,
            ..ParserConfig::default()
        });

        let result = parser.parse_bytes(&dji_basic_id_frame(), -65, TransportType::BtLegacy);
        assert!(result.success);
        assert_eq!(result.protocol, ProtocolType::AsdStan);
        assert_eq!(result.uav.unwrap().protocol, ProtocolType::AsdStan);
    }

    #[test]
    fn test_all_disabled_matches_nothing() {
        let mut parser = RemoteIdParser::with_config(ParserConfig {
            enable_astm: false,
            enable_asd: false,
            enable_cn: true,
            ..ParserConfig::default()
        });

        let result = parser.parse_bytes(&dji_basic_id_frame(), -65, TransportType::BtLegacy);
        assert!(!result.success);
        assert_eq!(result.error, Some(RidError::NoProtocolMatch));
    }

    #[test]
    fn test_wifi_nan_dispatch() {
        let mut parser = RemoteIdParser::new();

        let mut msg = [0u8; MESSAGE_SIZE];
        msg[0] = 0x02;
        msg[1] = 0x12;
        msg[2..8].copy_from_slice(b"NANUAV");

        let mut payload = vec![0x04, 0x09];
        payload.extend_from_slice(&[0x88, 0x69, 0x19, 0x9D, 0x92, 0x09]);
        payload.extend_from_slice(&msg);

        let result = parser.parse_bytes(&payload, -70, TransportType::WifiNan);
        assert!(result.success);
        let uav = result.uav.unwrap();
        assert_eq!(uav.id, "NANUAV");
        assert_eq!(uav.transport, TransportType::WifiNan);
    }

    #[test]
    fn test_fuzz_never_panics() {
        // Deterministic pseudo-random byte soup across the size range
        let mut parser = RemoteIdParser::new();
        let mut state = 0x12345678u32;
        let mut next = move || {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        };

        for len in (0..1024).step_by(17) {
            let payload: Vec<u8> = (0..len).map(|_| next()).collect();
            let _ = parser.parse_bytes(&payload, -60, TransportType::BtLegacy);
            let _ = parser.parse_bytes(&payload, -60, TransportType::WifiBeacon);
            let _ = parser.parse_bytes(&payload, -60, TransportType::WifiNan);
        }

        // Adversarial prefixes stitched onto short tails
        for tail_len in 0..MESSAGE_SIZE {
            let mut payload = vec![0x1E, 0x16, 0xFA, 0xFF, 0x00];
            payload.extend(std::iter::repeat(0xF2).take(tail_len));
            let _ = parser.parse_bytes(&payload, -60, TransportType::BtLegacy);
        }
    }
}
