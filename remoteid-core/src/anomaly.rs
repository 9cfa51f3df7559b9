//! Anomaly detection over the decoded aircraft stream.
//!
//! Flags updates that are physically implausible or smell like signal
//! manipulation: impossible speeds, teleporting positions, altitude spikes,
//! replayed messages, and RSSI swings that do not match the reported
//! movement. Detection never fails; invalid locations are silently ignored.

use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::Instant;

use serde::Serialize;

use crate::geo;
use crate::types::{Location, Uav};

/// RSSI at 1 m for the free-space path-loss model (dBm).
const RSSI_REF: f64 = -50.0;
/// Path-loss exponent.
const PATH_LOSS_EXP: f64 = 2.5;
/// Positions kept per aircraft.
const MAX_HISTORY: usize = 100;

/// Kinds of suspicious behavior the detector can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnomalyKind {
    /// Speed derived from consecutive positions exceeds physical limits.
    SpeedImpossible,
    /// Position moved impossibly far between updates.
    PositionJump,
    /// Altitude changed faster than any airframe can manage.
    AltitudeSpike,
    /// The same message keeps arriving within the replay window.
    ReplayAttack,
    /// RSSI change inconsistent with the reported position change.
    SignalAnomaly,
    /// Timestamps out of sequence.
    TimestampAnomaly,
    /// Multiple simultaneous locations for one ID.
    IdSpoof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AnomalySeverity {
    /// Might be normal.
    Info,
    /// Suspicious, needs attention.
    Warning,
    /// Definite anomaly, likely spoofing.
    Critical,
}

/// A single detection.
#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: AnomalySeverity,
    pub uav_id: String,
    pub description: String,
    /// 0.0 - 1.0.
    pub confidence: f64,
    #[serde(skip)]
    pub detected_at: Instant,
    pub expected_value: f64,
    pub actual_value: f64,
}

/// Detection thresholds.
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// m/s (~540 km/h).
    pub max_horizontal_speed: f32,
    /// m/s.
    pub max_vertical_speed: f32,
    /// m/s².
    pub max_acceleration: f32,
    /// Meters.
    pub max_position_jump_m: f64,
    /// m/s.
    pub max_altitude_change_rate: f32,
    /// Replay detection window.
    pub replay_window_ms: u32,
    /// Duplicates within the window before flagging.
    pub min_duplicate_count: usize,
    /// Fractional slack on the expected RSSI change.
    pub rssi_distance_tolerance: f64,
    /// dB change that triggers the signal check.
    pub min_rssi_change: i8,
    /// Gap beyond which consecutive updates are not compared.
    pub max_timestamp_gap_ms: u32,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            max_horizontal_speed: 150.0,
            max_vertical_speed: 50.0,
            max_acceleration: 30.0,
            max_position_jump_m: 1000.0,
            max_altitude_change_rate: 100.0,
            replay_window_ms: 5000,
            min_duplicate_count: 3,
            rssi_distance_tolerance: 0.3,
            min_rssi_change: 20,
            max_timestamp_gap_ms: 10_000,
        }
    }
}

/// Recent observations for one aircraft, FIFO-bounded.
#[derive(Debug, Default)]
struct UavHistory {
    positions: VecDeque<Location>,
    rssi_history: VecDeque<i8>,
    timestamps: VecDeque<Instant>,
    message_hashes: VecDeque<u32>,
}

impl UavHistory {
    fn push(&mut self, loc: Location, rssi: i8, time: Instant, msg_hash: u32) {
        self.positions.push_back(loc);
        self.rssi_history.push_back(rssi);
        self.timestamps.push_back(time);
        self.message_hashes.push_back(msg_hash);
        while self.positions.len() > MAX_HISTORY {
            self.positions.pop_front();
            self.rssi_history.pop_front();
            self.timestamps.pop_front();
            self.message_hashes.pop_front();
        }
    }
}

/// Stateful anomaly detector over post-merge aircraft updates.
pub struct AnomalyDetector {
    config: AnomalyConfig,
    history: HashMap<String, UavHistory>,
    counts: HashMap<AnomalyKind, usize>,
    total: usize,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::with_config(AnomalyConfig::default())
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        AnomalyDetector {
            config,
            history: HashMap::new(),
            counts: HashMap::new(),
            total: 0,
        }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Analyze one aircraft update. Returns all detections for this update.
    pub fn analyze(&mut self, uav: &Uav, rssi: i8) -> Vec<Anomaly> {
        self.analyze_at(uav, rssi, Instant::now())
    }

    /// Analysis against an explicit clock.
    pub fn analyze_at(&mut self, uav: &Uav, rssi: i8, now: Instant) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        if uav.id.is_empty() {
            return anomalies;
        }

        let msg_hash = hash_message(uav);

        anomalies.extend(self.check_replay(&uav.id, msg_hash, now));

        let hist = self.history.entry(uav.id.clone()).or_default();
        if let (Some(prev), Some(&prev_time)) = (hist.positions.back(), hist.timestamps.back()) {
            if uav.location.valid {
                let dt = now.duration_since(prev_time).as_secs_f64();
                let max_gap = self.config.max_timestamp_gap_ms as f64 / 1000.0;

                if dt > 0.0 && dt < max_gap {
                    anomalies.extend(check_speed(
                        &self.config,
                        &uav.id,
                        &uav.location,
                        prev,
                        dt,
                        now,
                    ));
                    anomalies.extend(check_position_jump(
                        &self.config,
                        &uav.id,
                        &uav.location,
                        prev,
                        dt,
                        now,
                    ));
                }

                anomalies.extend(check_signal(
                    &self.config,
                    &uav.id,
                    rssi,
                    &uav.location,
                    hist,
                    now,
                ));
            }
        }

        if uav.location.valid {
            let hist = self.history.entry(uav.id.clone()).or_default();
            hist.push(uav.location.clone(), rssi, now, msg_hash);
        }

        for a in &anomalies {
            *self.counts.entry(a.kind).or_insert(0) += 1;
            self.total += 1;
        }
        anomalies
    }

    fn check_replay(&mut self, id: &str, msg_hash: u32, now: Instant) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        let Some(hist) = self.history.get(id) else {
            return anomalies;
        };

        let window_ms = self.config.replay_window_ms as u128;
        let duplicates = hist
            .message_hashes
            .iter()
            .zip(hist.timestamps.iter())
            .filter(|(&h, &t)| h == msg_hash && now.duration_since(t).as_millis() < window_ms)
            .count();

        if duplicates >= self.config.min_duplicate_count {
            anomalies.push(Anomaly {
                kind: AnomalyKind::ReplayAttack,
                severity: AnomalySeverity::Critical,
                uav_id: id.to_string(),
                description: "Duplicate messages detected (possible replay attack)".into(),
                confidence: (duplicates as f64 / 10.0).min(1.0),
                detected_at: now,
                expected_value: 0.0,
                actual_value: duplicates as f64,
            });
        }

        anomalies
    }

    /// Rough transmitter range from RSSI via the inverse path-loss model.
    pub fn estimate_distance_from_rssi(&self, rssi: i8) -> f64 {
        10f64.powf((RSSI_REF - rssi as f64) / (10.0 * PATH_LOSS_EXP))
    }

    pub fn total_anomalies(&self) -> usize {
        self.total
    }

    pub fn anomaly_count(&self, kind: AnomalyKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Drop all history and counters.
    pub fn clear(&mut self) {
        self.history.clear();
        self.counts.clear();
        self.total = 0;
    }

    /// Drop history for one aircraft.
    pub fn clear_uav(&mut self, id: &str) {
        self.history.remove(id);
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn check_speed(
    config: &AnomalyConfig,
    id: &str,
    current: &Location,
    previous: &Location,
    dt: f64,
    now: Instant,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    let distance = geo::distance_m(
        previous.latitude,
        previous.longitude,
        current.latitude,
        current.longitude,
    );
    let speed = distance / dt;
    let limit = config.max_horizontal_speed as f64;

    if speed > limit {
        anomalies.push(Anomaly {
            kind: AnomalyKind::SpeedImpossible,
            severity: if speed > limit * 2.0 {
                AnomalySeverity::Critical
            } else {
                AnomalySeverity::Warning
            },
            uav_id: id.to_string(),
            description: "Calculated horizontal speed exceeds physical limits".into(),
            confidence: (speed / (limit * 3.0)).min(1.0),
            detected_at: now,
            expected_value: limit,
            actual_value: speed,
        });
    }

    let vertical_speed = (current.altitude_geo - previous.altitude_geo).abs() as f64 / dt;
    let v_limit = config.max_vertical_speed as f64;

    if vertical_speed > v_limit {
        anomalies.push(Anomaly {
            kind: AnomalyKind::AltitudeSpike,
            severity: if vertical_speed > v_limit * 2.0 {
                AnomalySeverity::Critical
            } else {
                AnomalySeverity::Warning
            },
            uav_id: id.to_string(),
            description: "Vertical speed exceeds physical limits".into(),
            confidence: (vertical_speed / (v_limit * 3.0)).min(1.0),
            detected_at: now,
            expected_value: v_limit,
            actual_value: vertical_speed,
        });
    }

    // Acceleration from the reported speeds, when both are usable
    if current.speed_horizontal >= 0.0 && previous.speed_horizontal >= 0.0 {
        let acceleration =
            (current.speed_horizontal - previous.speed_horizontal).abs() as f64 / dt;
        let a_limit = config.max_acceleration as f64;

        if acceleration > a_limit {
            anomalies.push(Anomaly {
                kind: AnomalyKind::SpeedImpossible,
                severity: AnomalySeverity::Warning,
                uav_id: id.to_string(),
                description: "Acceleration exceeds reasonable limits".into(),
                confidence: (acceleration / (a_limit * 2.0)).min(1.0),
                detected_at: now,
                expected_value: a_limit,
                actual_value: acceleration,
            });
        }
    }

    anomalies
}

fn check_position_jump(
    config: &AnomalyConfig,
    id: &str,
    current: &Location,
    previous: &Location,
    dt: f64,
    now: Instant,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    let distance = geo::distance_m(
        previous.latitude,
        previous.longitude,
        current.latitude,
        current.longitude,
    );
    let max_possible = config.max_horizontal_speed as f64 * dt;

    if distance > config.max_position_jump_m && distance > max_possible * 1.5 {
        anomalies.push(Anomaly {
            kind: AnomalyKind::PositionJump,
            severity: AnomalySeverity::Critical,
            uav_id: id.to_string(),
            description: "Position jumped impossibly far".into(),
            confidence: (distance / (max_possible * 3.0)).min(1.0),
            detected_at: now,
            expected_value: max_possible,
            actual_value: distance,
        });
    }

    anomalies
}

fn check_signal(
    config: &AnomalyConfig,
    id: &str,
    current_rssi: i8,
    location: &Location,
    hist: &UavHistory,
    now: Instant,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if hist.rssi_history.len() < 3 {
        return anomalies;
    }

    let avg_rssi: f64 =
        hist.rssi_history.iter().map(|&r| r as f64).sum::<f64>() / hist.rssi_history.len() as f64;

    let rssi_diff = (current_rssi as f64 - avg_rssi).abs();
    if rssi_diff <= config.min_rssi_change as f64 {
        return anomalies;
    }

    let Some(prev) = hist.positions.back() else {
        return anomalies;
    };

    let distance = geo::distance_m(
        prev.latitude,
        prev.longitude,
        location.latitude,
        location.longitude,
    );

    // A real position change of d meters explains about this much dB
    let expected_change = 10.0 * PATH_LOSS_EXP * distance.max(1.0).log10();

    if rssi_diff > expected_change * (1.0 + config.rssi_distance_tolerance) {
        anomalies.push(Anomaly {
            kind: AnomalyKind::SignalAnomaly,
            severity: AnomalySeverity::Warning,
            uav_id: id.to_string(),
            description: "RSSI change inconsistent with position change".into(),
            confidence: (rssi_diff / 40.0).min(1.0),
            detected_at: now,
            expected_value: expected_change,
            actual_value: rssi_diff,
        });
    }

    anomalies
}

/// Combined hash over the fields a replayed message cannot vary.
fn hash_message(uav: &Uav) -> u32 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    uav.id.hash(&mut h);
    uav.location.latitude.to_bits().hash(&mut h);
    uav.location.longitude.to_bits().hash(&mut h);
    uav.location.altitude_geo.to_bits().hash(&mut h);
    uav.location.speed_horizontal.to_bits().hash(&mut h);
    h.finish() as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
