//! C ABI for the Remote-ID decode-and-track pipeline.
//!
//! Exposes an opaque parser handle plus fixed-layout record types for
//! callers that cannot link Rust: JNI shims, Python ctypes, embedded hosts.
//! Field order and widths of the `#[repr(C)]` records are part of the ABI,
//! as are the enum discriminants, which mirror the core enums exactly.
//!
//! Strings are fixed-width and NUL-terminated; oversized values are
//! truncated. `last_seen_ms` counts milliseconds on the library's internal
//! monotonic clock — callers must treat it as opaque and only compare
//! values from the same process.

use std::ffi::{c_char, c_void, CStr};
use std::sync::OnceLock;
use std::time::Instant;

use remoteid_core::{ParserConfig, RemoteIdParser, TransportType, Uav};

pub const RID_MAX_ID_LENGTH: usize = 64;
pub const RID_MAX_DESCRIPTION_LENGTH: usize = 64;
pub const RID_MAX_ERROR_LENGTH: usize = 128;

/// Payloads above this size are rejected at the boundary.
pub const RID_MAX_PAYLOAD: usize = 1024;

/// Monotonic epoch for `last_seen_ms`, fixed at first use.
fn clock_epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

fn instant_to_ms(t: Instant) -> u64 {
    t.saturating_duration_since(clock_epoch()).as_millis() as u64
}

// ---------------------------------------------------------------------------
// Fixed-layout records
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RidLocation {
    pub valid: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_baro: f32,
    pub altitude_geo: f32,
    pub height: f32,
    pub speed_horizontal: f32,
    pub speed_vertical: f32,
    pub direction: f32,
    pub status: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RidSystemInfo {
    pub valid: u32,
    pub operator_latitude: f64,
    pub operator_longitude: f64,
    pub area_ceiling: f32,
    pub area_floor: f32,
    pub area_count: u16,
    pub area_radius: u16,
    pub timestamp: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RidUav {
    pub id: [c_char; RID_MAX_ID_LENGTH],
    pub id_type: u32,
    pub uav_type: u32,
    pub protocol: u32,
    pub transport: u32,
    pub rssi: i8,
    pub last_seen_ms: u64,
    pub location: RidLocation,
    pub system: RidSystemInfo,
    pub has_self_id: u32,
    pub self_id_description: [c_char; RID_MAX_DESCRIPTION_LENGTH],
    pub has_operator_id: u32,
    pub operator_id: [c_char; RID_MAX_ID_LENGTH],
    pub message_count: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RidResult {
    pub success: u32,
    pub is_remote_id: u32,
    pub protocol: u32,
    pub error: [c_char; RID_MAX_ERROR_LENGTH],
    pub uav: RidUav,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RidConfig {
    pub uav_timeout_ms: u32,
    pub enable_deduplication: u32,
    pub enable_astm: u32,
    pub enable_asd: u32,
    pub enable_cn: u32,
}

pub type RidUavCallback = extern "C" fn(uav: *const RidUav, user_data: *mut c_void);

/// Opaque parser handle.
pub struct RidParser {
    inner: RemoteIdParser,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn copy_str(dst: &mut [c_char], src: &str) {
    let n = src.len().min(dst.len() - 1);
    for (d, s) in dst[..n].iter_mut().zip(src.as_bytes()) {
        *d = *s as c_char;
    }
    dst[n] = 0;
}

fn transport_from_u32(v: u32) -> TransportType {
    match v {
        1 => TransportType::BtLegacy,
        2 => TransportType::BtExtended,
        3 => TransportType::WifiBeacon,
        4 => TransportType::WifiNan,
        _ => TransportType::Unknown,
    }
}

impl Default for RidUav {
    fn default() -> Self {
        RidUav {
            id: [0; RID_MAX_ID_LENGTH],
            id_type: 0,
            uav_type: 0,
            protocol: 0,
            transport: 0,
            rssi: 0,
            last_seen_ms: 0,
            location: RidLocation {
                valid: 0,
                latitude: 0.0,
                longitude: 0.0,
                altitude_baro: 0.0,
                altitude_geo: 0.0,
                height: 0.0,
                speed_horizontal: 0.0,
                speed_vertical: 0.0,
                direction: 0.0,
                status: 0,
            },
            system: RidSystemInfo {
                valid: 0,
                operator_latitude: 0.0,
                operator_longitude: 0.0,
                area_ceiling: 0.0,
                area_floor: 0.0,
                area_count: 0,
                area_radius: 0,
                timestamp: 0,
            },
            has_self_id: 0,
            self_id_description: [0; RID_MAX_DESCRIPTION_LENGTH],
            has_operator_id: 0,
            operator_id: [0; RID_MAX_ID_LENGTH],
            message_count: 0,
        }
    }
}

impl RidUav {
    fn from_core(uav: &Uav) -> Self {
        let mut out = RidUav {
            id_type: uav.id_type as u32,
            uav_type: uav.uav_type as u32,
            protocol: uav.protocol as u32,
            transport: uav.transport as u32,
            rssi: uav.rssi,
            last_seen_ms: instant_to_ms(uav.last_seen),
            location: RidLocation {
                valid: uav.location.valid as u32,
                latitude: uav.location.latitude,
                longitude: uav.location.longitude,
                altitude_baro: uav.location.altitude_baro,
                altitude_geo: uav.location.altitude_geo,
                height: uav.location.height,
                speed_horizontal: uav.location.speed_horizontal,
                speed_vertical: uav.location.speed_vertical,
                direction: uav.location.direction,
                status: uav.location.status as u32,
            },
            system: RidSystemInfo {
                valid: uav.system.valid as u32,
                operator_latitude: uav.system.operator_latitude,
                operator_longitude: uav.system.operator_longitude,
                area_ceiling: uav.system.area_ceiling,
                area_floor: uav.system.area_floor,
                area_count: uav.system.area_count,
                area_radius: uav.system.area_radius,
                timestamp: uav.system.timestamp,
            },
            has_self_id: uav.self_id.valid as u32,
            has_operator_id: uav.operator_id.valid as u32,
            message_count: uav.message_count,
            ..RidUav::default()
        };
        copy_str(&mut out.id, &uav.id);
        copy_str(&mut out.self_id_description, &uav.self_id.description);
        copy_str(&mut out.operator_id, &uav.operator_id.id);
        out
    }
}

// ---------------------------------------------------------------------------
// Library functions
// ---------------------------------------------------------------------------

/// Library version string; static storage, do not free.
#[no_mangle]
pub extern "C" fn rid_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rid_default_config() -> RidConfig {
    let d = ParserConfig::default();
    RidConfig {
        uav_timeout_ms: d.uav_timeout_ms,
        enable_deduplication: d.enable_deduplication as u32,
        enable_astm: d.enable_astm as u32,
        enable_asd: d.enable_asd as u32,
        enable_cn: d.enable_cn as u32,
    }
}

/// Create a parser with default configuration. Free with `rid_destroy`.
#[no_mangle]
pub extern "C" fn rid_create() -> *mut RidParser {
    Box::into_raw(Box::new(RidParser {
        inner: RemoteIdParser::new(),
    }))
}

/// Create a parser with custom configuration. Returns NULL if `config` is
/// NULL. Free with `rid_destroy`.
///
/// # Safety
/// `config` must be NULL or point to a valid `RidConfig`.
#[no_mangle]
pub unsafe extern "C" fn rid_create_with_config(config: *const RidConfig) -> *mut RidParser {
    if config.is_null() {
        return std::ptr::null_mut();
    }
    let c = &*config;
    let parser = RemoteIdParser::with_config(ParserConfig {
        uav_timeout_ms: c.uav_timeout_ms,
        enable_deduplication: c.enable_deduplication != 0,
        enable_astm: c.enable_astm != 0,
        enable_asd: c.enable_asd != 0,
        enable_cn: c.enable_cn != 0,
    });
    Box::into_raw(Box::new(RidParser { inner: parser }))
}

/// Destroy a parser created by `rid_create` / `rid_create_with_config`.
///
/// # Safety
/// `parser` must be NULL or a pointer previously returned by the create
/// functions, and must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn rid_destroy(parser: *mut RidParser) {
    if !parser.is_null() {
        drop(Box::from_raw(parser));
    }
}

/// Parse a raw payload. Returns 0 when the frame decoded successfully,
/// non-zero otherwise; details land in `result`.
///
/// # Safety
/// `parser` and `result` must be valid pointers; `payload` must point to
/// `payload_len` readable bytes (it may be NULL only when `payload_len` is 0).
#[no_mangle]
pub unsafe extern "C" fn rid_parse(
    parser: *mut RidParser,
    payload: *const u8,
    payload_len: usize,
    rssi: i8,
    transport: u32,
    result: *mut RidResult,
) -> i32 {
    if parser.is_null() || result.is_null() {
        return -1;
    }

    let out = &mut *result;
    *out = RidResult {
        success: 0,
        is_remote_id: 0,
        protocol: 0,
        error: [0; RID_MAX_ERROR_LENGTH],
        uav: RidUav::default(),
    };

    if payload_len > RID_MAX_PAYLOAD {
        copy_str(&mut out.error, "Payload exceeds maximum frame size");
        return 1;
    }

    let bytes: &[u8] = if payload.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(payload, payload_len)
    };

    let parsed = (*parser)
        .inner
        .parse_bytes(bytes, rssi, transport_from_u32(transport));

    out.success = parsed.success as u32;
    out.is_remote_id = parsed.is_remote_id as u32;
    out.protocol = parsed.protocol as u32;
    if let Some(err) = &parsed.error {
        copy_str(&mut out.error, &err.to_string());
    }
    if let Some(uav) = &parsed.uav {
        out.uav = RidUav::from_core(uav);
    }

    if parsed.success {
        0
    } else {
        1
    }
}

/// Number of currently tracked aircraft.
///
/// # Safety
/// `parser` must be a valid parser pointer.
#[no_mangle]
pub unsafe extern "C" fn rid_active_count(parser: *const RidParser) -> usize {
    if parser.is_null() {
        return 0;
    }
    (*parser).inner.active_count()
}

/// Copy up to `max_count` tracked aircraft into `uavs`, most recently seen
/// first. Returns the number copied.
///
/// # Safety
/// `parser` must be valid; `uavs` must point to space for `max_count`
/// `RidUav` records.
#[no_mangle]
pub unsafe extern "C" fn rid_active_uavs(
    parser: *const RidParser,
    uavs: *mut RidUav,
    max_count: usize,
) -> usize {
    if parser.is_null() || uavs.is_null() || max_count == 0 {
        return 0;
    }

    let active = (*parser).inner.active_uavs();
    let n = active.len().min(max_count);
    for (i, uav) in active.iter().take(n).enumerate() {
        *uavs.add(i) = RidUav::from_core(uav);
    }
    n
}

/// Look up one aircraft by ID. Returns 0 and fills `uav` when found.
///
/// # Safety
/// `parser` and `uav` must be valid; `id` must be a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn rid_get_uav(
    parser: *const RidParser,
    id: *const c_char,
    uav: *mut RidUav,
) -> i32 {
    if parser.is_null() || id.is_null() || uav.is_null() {
        return -1;
    }

    let Ok(id) = CStr::from_ptr(id).to_str() else {
        return -1;
    };

    match (*parser).inner.get_uav(id) {
        Some(found) => {
            *uav = RidUav::from_core(found);
            0
        }
        None => 1,
    }
}

/// Drop all tracked aircraft without firing callbacks.
///
/// # Safety
/// `parser` must be a valid parser pointer.
#[no_mangle]
pub unsafe extern "C" fn rid_clear(parser: *mut RidParser) {
    if !parser.is_null() {
        (*parser).inner.clear();
    }
}

/// Evict timed-out aircraft; fires the timeout callback per eviction.
/// Returns the number evicted.
///
/// # Safety
/// `parser` must be a valid parser pointer.
#[no_mangle]
pub unsafe extern "C" fn rid_cleanup(parser: *mut RidParser) -> usize {
    if parser.is_null() {
        return 0;
    }
    (*parser).inner.cleanup().len()
}

unsafe fn install_callback(
    set: impl FnOnce(&mut RemoteIdParser, remoteid_core::session::UavCallback),
    parser: *mut RidParser,
    callback: RidUavCallback,
    user_data: *mut c_void,
) {
    if parser.is_null() {
        return;
    }
    // The record is rebuilt per call; the callback borrow ends when it returns
    let user_data = user_data as usize;
    set(
        &mut (*parser).inner,
        Box::new(move |uav: &Uav| {
            let record = RidUav::from_core(uav);
            callback(&record, user_data as *mut c_void);
        }),
    );
}

/// Install the new-aircraft callback, replacing any previous one.
///
/// # Safety
/// `parser` must be valid; `callback` must remain callable for the parser's
/// lifetime; `user_data` is passed through untouched.
#[no_mangle]
pub unsafe extern "C" fn rid_set_on_new_uav(
    parser: *mut RidParser,
    callback: RidUavCallback,
    user_data: *mut c_void,
) {
    install_callback(|p, cb| p.set_on_new_uav(cb), parser, callback, user_data);
}

/// Install the update callback, replacing any previous one.
///
/// # Safety
/// Same contract as `rid_set_on_new_uav`.
#[no_mangle]
pub unsafe extern "C" fn rid_set_on_uav_update(
    parser: *mut RidParser,
    callback: RidUavCallback,
    user_data: *mut c_void,
) {
    install_callback(|p, cb| p.set_on_uav_update(cb), parser, callback, user_data);
}

/// Install the timeout callback, replacing any previous one.
///
/// # Safety
/// Same contract as `rid_set_on_new_uav`.
#[no_mangle]
pub unsafe extern "C" fn rid_set_on_uav_timeout(
    parser: *mut RidParser,
    callback: RidUavCallback,
    user_data: *mut c_void,
) {
    install_callback(|p, cb| p.set_on_uav_timeout(cb), parser, callback, user_data);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    fn dji_frame() -> Vec<u8> {
        let mut payload = vec![0x1E, 0x16, 0xFA, 0xFF, 0x00, 0x02, 0x12];
        payload.extend_from_slice(b"DJI1234567890ABCD");
        payload.extend_from_slice(&[0x00; 6]);
        payload
    }

    fn id_str(buf: &[c_char]) -> String {
        let bytes: Vec<u8> = buf
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_record_layout_is_fixed() {
        // Field widths are ABI; catch accidental struct edits
        assert_eq!(mem::size_of::<RidConfig>(), 20);
        assert!(mem::size_of::<RidUav>() >= RID_MAX_ID_LENGTH * 2 + RID_MAX_DESCRIPTION_LENGTH);
        assert_eq!(mem::align_of::<RidLocation>(), 8);
    }

    #[test]
    fn test_default_config_matches_core() {
        let c = rid_default_config();
        assert_eq!(c.uav_timeout_ms, 30_000);
        assert_eq!(c.enable_deduplication, 1);
        assert_eq!(c.enable_astm, 1);
        assert_eq!(c.enable_asd, 0);
        assert_eq!(c.enable_cn, 0);
    }

    #[test]
    fn test_version_string() {
        let v = rid_version();
        assert!(!v.is_null());
        let s = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert!(!s.is_empty());
    }

    #[test]
    fn test_parse_roundtrip() {
        unsafe {
            let parser = rid_create();
            let frame = dji_frame();
            let mut result = mem::zeroed::<RidResult>();

            let rc = rid_parse(
                parser,
                frame.as_ptr(),
                frame.len(),
                -65,
                1, // BT legacy
                &mut result,
            );

            assert_eq!(rc, 0);
            assert_eq!(result.success, 1);
            assert_eq!(result.is_remote_id, 1);
            assert_eq!(result.protocol, 1); // ASTM F3411
            assert_eq!(id_str(&result.uav.id), "DJI1234567890ABCD");
            assert_eq!(result.uav.id_type, 1);
            assert_eq!(result.uav.uav_type, 2);
            assert_eq!(result.uav.rssi, -65);
            assert_eq!(result.uav.message_count, 1);

            assert_eq!(rid_active_count(parser), 1);
            rid_destroy(parser);
        }
    }

    #[test]
    fn test_parse_empty_payload() {
        unsafe {
            let parser = rid_create();
            let mut result = mem::zeroed::<RidResult>();

            let rc = rid_parse(parser, std::ptr::null(), 0, -60, 1, &mut result);
            assert_eq!(rc, 1);
            assert_eq!(result.success, 0);
            assert_eq!(result.is_remote_id, 0);
            assert_eq!(id_str(&result.error), "Empty payload");

            rid_destroy(parser);
        }
    }

    #[test]
    fn test_parse_oversized_payload_rejected() {
        unsafe {
            let parser = rid_create();
            let huge = vec![0u8; RID_MAX_PAYLOAD + 1];
            let mut result = mem::zeroed::<RidResult>();

            let rc = rid_parse(parser, huge.as_ptr(), huge.len(), -60, 1, &mut result);
            assert_eq!(rc, 1);
            assert_eq!(result.success, 0);

            rid_destroy(parser);
        }
    }

    #[test]
    fn test_active_uavs_snapshot() {
        unsafe {
            let parser = rid_create();
            let frame = dji_frame();
            let mut result = mem::zeroed::<RidResult>();
            rid_parse(parser, frame.as_ptr(), frame.len(), -65, 1, &mut result);

            let mut buf = [RidUav::default(); 4];
            let n = rid_active_uavs(parser, buf.as_mut_ptr(), buf.len());
            assert_eq!(n, 1);
            assert_eq!(id_str(&buf[0].id), "DJI1234567890ABCD");

            rid_destroy(parser);
        }
    }

    #[test]
    fn test_get_uav_by_id() {
        unsafe {
            let parser = rid_create();
            let frame = dji_frame();
            let mut result = mem::zeroed::<RidResult>();
            rid_parse(parser, frame.as_ptr(), frame.len(), -65, 1, &mut result);

            let mut uav = RidUav::default();
            let id = b"DJI1234567890ABCD\0";
            assert_eq!(
                rid_get_uav(parser, id.as_ptr() as *const c_char, &mut uav),
                0
            );
            assert_eq!(uav.message_count, 1);

            let missing = b"NOPE\0";
            assert_eq!(
                rid_get_uav(parser, missing.as_ptr() as *const c_char, &mut uav),
                1
            );

            rid_clear(parser);
            assert_eq!(rid_active_count(parser), 0);
            rid_destroy(parser);
        }
    }

    #[test]
    fn test_callbacks_through_c_abi() {
        extern "C" fn on_new(_uav: *const RidUav, user_data: *mut c_void) {
            unsafe { *(user_data as *mut u32) += 1 };
        }

        unsafe {
            let parser = rid_create();
            let mut new_count: u32 = 0;
            rid_set_on_new_uav(parser, on_new, &mut new_count as *mut u32 as *mut c_void);

            let frame = dji_frame();
            let mut result = mem::zeroed::<RidResult>();
            rid_parse(parser, frame.as_ptr(), frame.len(), -65, 1, &mut result);
            rid_parse(parser, frame.as_ptr(), frame.len(), -64, 1, &mut result);

            assert_eq!(new_count, 1);
            rid_destroy(parser);
        }
    }

    #[test]
    fn test_null_safety() {
        unsafe {
            rid_destroy(std::ptr::null_mut());
            rid_clear(std::ptr::null_mut());
            assert_eq!(rid_active_count(std::ptr::null()), 0);
            assert_eq!(rid_cleanup(std::ptr::null_mut()), 0);
            assert_eq!(
                rid_parse(std::ptr::null_mut(), std::ptr::null(), 0, 0, 0, std::ptr::null_mut()),
                -1
            );
            assert!(rid_create_with_config(std::ptr::null()).is_null());
        }
    }

    #[test]
    fn test_string_truncation() {
        let mut buf = [0 as c_char; 8];
        copy_str(&mut buf, "ABCDEFGHIJKLMNOP");
        assert_eq!(id_str(&buf), "ABCDEFG"); // 7 chars + NUL
    }
}
