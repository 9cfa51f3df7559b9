//! Historical track analysis: smoothing, prediction, and flight-pattern
//! classification per aircraft.
//!
//! Raw positions are recorded when the aircraft has moved at least
//! `min_movement_m`; a parallel exponentially smoothed track is maintained,
//! and statistics plus the pattern label are refreshed every ten raw points.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::geo;
use crate::types::Location;

/// One recorded track point.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters (geodetic).
    pub altitude: f32,
    /// Reported horizontal speed, m/s.
    pub speed: f32,
    /// Reported track direction, degrees.
    pub heading: f32,
    pub timestamp: Instant,
}

/// A projected future position with its uncertainty.
#[derive(Debug, Clone, Copy)]
pub struct PredictedPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f32,
    /// 0.0 - 1.0; 0 means no usable prediction.
    pub confidence: f64,
    pub error_radius_m: f64,
    pub prediction_time: Instant,
}

/// Aggregate figures over a recorded track.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TrajectoryStats {
    pub total_distance_m: f64,
    pub max_speed_mps: f64,
    pub avg_speed_mps: f64,
    pub max_altitude_m: f32,
    pub min_altitude_m: f32,
    /// Circular standard deviation of headings, degrees.
    pub heading_variance: f64,
    #[serde(skip)]
    pub duration: Duration,
    pub point_count: usize,
}

/// Flight pattern labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FlightPattern {
    #[default]
    Unknown = 0,
    /// Hovering in place.
    Stationary = 1,
    /// Straight-line flight.
    Linear = 2,
    /// Consistent turning.
    Circular = 3,
    /// Back-and-forth sweeps.
    Patrol = 4,
    /// No discernible structure.
    Erratic = 5,
    /// Sustained descent.
    Landing = 6,
    /// Sustained climb.
    Takeoff = 7,
}

/// Analyzer tunables.
#[derive(Debug, Clone)]
pub struct TrajectoryConfig {
    pub max_history_points: usize,
    /// Exponential smoothing alpha.
    pub smoothing_factor: f64,
    /// Default look-ahead for prediction.
    pub prediction_horizon_ms: u32,
    /// Movement below this distance is not recorded.
    pub min_movement_m: f64,
    /// Mean speed below this is "stationary", m/s.
    pub stationary_speed_threshold: f32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        TrajectoryConfig {
            max_history_points: 1000,
            smoothing_factor: 0.3,
            prediction_horizon_ms: 5000,
            min_movement_m: 1.0,
            stationary_speed_threshold: 0.5,
        }
    }
}

/// Recorded track state for one aircraft.
#[derive(Debug, Default)]
pub struct Trajectory {
    pub uav_id: String,
    pub points: VecDeque<TrajectoryPoint>,
    pub smoothed_points: VecDeque<TrajectoryPoint>,
    pub stats: TrajectoryStats,
    pub pattern: FlightPattern,
}

impl Trajectory {
    fn add_point(&mut self, point: TrajectoryPoint, max_size: usize) {
        self.points.push_back(point);
        while self.points.len() > max_size {
            self.points.pop_front();
        }
    }

    fn recalculate_stats(&mut self) {
        let Some(first) = self.points.front() else {
            self.stats = TrajectoryStats::default();
            return;
        };

        let mut stats = TrajectoryStats {
            point_count: self.points.len(),
            max_altitude_m: first.altitude,
            min_altitude_m: first.altitude,
            ..TrajectoryStats::default()
        };

        let mut speed_sum = 0.0f64;
        let mut prev: Option<&TrajectoryPoint> = None;
        for p in &self.points {
            stats.max_altitude_m = stats.max_altitude_m.max(p.altitude);
            stats.min_altitude_m = stats.min_altitude_m.min(p.altitude);
            stats.max_speed_mps = stats.max_speed_mps.max(p.speed as f64);
            speed_sum += p.speed as f64;

            if let Some(prev) = prev {
                stats.total_distance_m +=
                    geo::distance_m(prev.latitude, prev.longitude, p.latitude, p.longitude);
            }
            prev = Some(p);
        }

        stats.avg_speed_mps = speed_sum / self.points.len() as f64;
        stats.heading_variance = heading_variance(&self.points);
        if self.points.len() >= 2 {
            stats.duration = self
                .points
                .back()
                .unwrap()
                .timestamp
                .duration_since(first.timestamp);
        }

        self.stats = stats;
    }
}

/// Per-aircraft trajectory store and analysis engine.
pub struct TrajectoryAnalyzer {
    config: TrajectoryConfig,
    trajectories: HashMap<String, Trajectory>,
}

impl TrajectoryAnalyzer {
    pub fn new() -> Self {
        Self::with_config(TrajectoryConfig::default())
    }

    pub fn with_config(config: TrajectoryConfig) -> Self {
        TrajectoryAnalyzer {
            config,
            trajectories: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Record a decoded position for an aircraft. Invalid locations and
    /// sub-threshold movement are ignored.
    pub fn add_position(&mut self, uav_id: &str, location: &Location) {
        self.add_position_at(uav_id, location, Instant::now());
    }

    /// Record against an explicit clock.
    pub fn add_position_at(&mut self, uav_id: &str, location: &Location, now: Instant) {
        if !location.valid {
            return;
        }

        let traj = self.trajectories.entry(uav_id.to_string()).or_default();
        if traj.uav_id.is_empty() {
            traj.uav_id = uav_id.to_string();
        }

        let point = TrajectoryPoint {
            latitude: location.latitude,
            longitude: location.longitude,
            altitude: location.altitude_geo,
            speed: location.speed_horizontal,
            heading: location.direction,
            timestamp: now,
        };

        if let Some(last) = traj.points.back() {
            let dist = geo::distance_m(
                last.latitude,
                last.longitude,
                point.latitude,
                point.longitude,
            );
            if dist < self.config.min_movement_m {
                return;
            }
        }

        traj.add_point(point, self.config.max_history_points);

        match traj.smoothed_points.back() {
            None => traj.smoothed_points.push_back(point),
            Some(prev) => {
                let smoothed = smooth_point(&point, prev, self.config.smoothing_factor);
                traj.smoothed_points.push_back(smoothed);
                while traj.smoothed_points.len() > self.config.max_history_points {
                    traj.smoothed_points.pop_front();
                }
            }
        }

        if traj.points.len().is_multiple_of(10) {
            traj.recalculate_stats();
            traj.pattern = classify(traj, &self.config);
        }
    }

    pub fn trajectory(&self, uav_id: &str) -> Option<&Trajectory> {
        self.trajectories.get(uav_id)
    }

    /// IDs of all aircraft with recorded track state.
    pub fn tracked_uavs(&self) -> Vec<String> {
        self.trajectories.keys().cloned().collect()
    }

    /// Linear prediction along the bearing of the last two (smoothed) points.
    pub fn predict_position(&self, uav_id: &str, horizon_ms: u32) -> PredictedPosition {
        let now = Instant::now();
        let horizon_s = horizon_ms as f64 / 1000.0;
        let mut pred = PredictedPosition {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            confidence: 0.0,
            error_radius_m: 0.0,
            prediction_time: now + Duration::from_millis(horizon_ms as u64),
        };

        let Some(traj) = self.trajectories.get(uav_id) else {
            return pred;
        };
        if traj.points.len() < 2 {
            return pred;
        }

        let points = if traj.smoothed_points.is_empty() {
            &traj.points
        } else {
            &traj.smoothed_points
        };
        if points.len() < 2 {
            return pred;
        }

        let p1 = &points[points.len() - 2];
        let p2 = &points[points.len() - 1];

        let dt = p2.timestamp.duration_since(p1.timestamp).as_secs_f64();
        if dt <= 0.0 {
            pred.latitude = p2.latitude;
            pred.longitude = p2.longitude;
            pred.altitude = p2.altitude;
            pred.confidence = 0.5;
            return pred;
        }

        let bearing = geo::initial_bearing(p1.latitude, p1.longitude, p2.latitude, p2.longitude);
        let distance = geo::distance_m(p1.latitude, p1.longitude, p2.latitude, p2.longitude);
        let speed = distance / dt;
        let alt_rate = (p2.altitude - p1.altitude) as f64 / dt;

        let (lat, lon) = geo::project(p2.latitude, p2.longitude, bearing, speed * horizon_s);
        pred.latitude = lat;
        pred.longitude = lon;
        pred.altitude = p2.altitude + (alt_rate * horizon_s) as f32;

        // Confidence decays with the horizon; the error radius grows with it
        pred.confidence = (1.0 - horizon_s / 30.0).max(0.0);
        pred.error_radius_m = speed * horizon_s * 0.1 + horizon_s * 2.0;

        pred
    }

    /// Snapshot of the smoothed track.
    pub fn smoothed_trajectory(&self, uav_id: &str) -> Vec<TrajectoryPoint> {
        self.trajectories
            .get(uav_id)
            .map(|t| t.smoothed_points.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Most recently computed pattern label.
    pub fn classify_pattern(&self, uav_id: &str) -> FlightPattern {
        self.trajectories
            .get(uav_id)
            .map(|t| t.pattern)
            .unwrap_or(FlightPattern::Unknown)
    }

    /// Most recently computed statistics.
    pub fn stats(&self, uav_id: &str) -> TrajectoryStats {
        self.trajectories
            .get(uav_id)
            .map(|t| t.stats)
            .unwrap_or_default()
    }

    /// Haversine distance in meters.
    pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        geo::distance_m(lat1, lon1, lat2, lon2)
    }

    /// Initial bearing in [0, 360).
    pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        geo::initial_bearing(lat1, lon1, lat2, lon2)
    }

    /// Project along a bearing; returns `(lat, lon)`.
    pub fn project(lat: f64, lon: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
        geo::project(lat, lon, bearing_deg, distance_m)
    }

    pub fn clear(&mut self) {
        self.trajectories.clear();
    }

    pub fn clear_uav(&mut self, uav_id: &str) {
        self.trajectories.remove(uav_id);
    }
}

impl Default for TrajectoryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn smooth_point(raw: &TrajectoryPoint, prev: &TrajectoryPoint, alpha: f64) -> TrajectoryPoint {
    TrajectoryPoint {
        latitude: alpha * raw.latitude + (1.0 - alpha) * prev.latitude,
        longitude: alpha * raw.longitude + (1.0 - alpha) * prev.longitude,
        altitude: (alpha * raw.altitude as f64 + (1.0 - alpha) * prev.altitude as f64) as f32,
        speed: (alpha * raw.speed as f64 + (1.0 - alpha) * prev.speed as f64) as f32,
        heading: (alpha * raw.heading as f64 + (1.0 - alpha) * prev.heading as f64) as f32,
        timestamp: raw.timestamp,
    }
}

/// Normalize a heading delta into (-180, 180].
fn norm_delta(mut delta: f64) -> f64 {
    while delta > 180.0 {
        delta -= 360.0;
    }
    while delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Circular standard deviation of the recorded headings, in degrees.
fn heading_variance(points: &VecDeque<TrajectoryPoint>) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let (sin_sum, cos_sum) = points.iter().fold((0.0f64, 0.0f64), |(s, c), p| {
        let h = (p.heading as f64).to_radians();
        (s + h.sin(), c + h.cos())
    });
    let mean = sin_sum.atan2(cos_sum).to_degrees();

    let var_sum: f64 = points
        .iter()
        .map(|p| {
            let diff = norm_delta(p.heading as f64 - mean);
            diff * diff
        })
        .sum();

    (var_sum / points.len() as f64).sqrt()
}

/// Classify the flight pattern from the raw buffer. Needs at least five
/// points; the decision ladder runs from cheap cues to heading statistics.
fn classify(traj: &Trajectory, config: &TrajectoryConfig) -> FlightPattern {
    let points = &traj.points;
    if points.len() < 5 {
        return FlightPattern::Unknown;
    }

    let avg_speed =
        points.iter().map(|p| p.speed as f64).sum::<f64>() / points.len() as f64;

    if avg_speed < config.stationary_speed_threshold as f64 {
        return FlightPattern::Stationary;
    }

    let alt_diff = points.back().unwrap().altitude - points.front().unwrap().altitude;
    if alt_diff < -10.0 && avg_speed < 5.0 {
        return FlightPattern::Landing;
    }
    if alt_diff > 10.0 && avg_speed < 5.0 {
        return FlightPattern::Takeoff;
    }

    let variance = heading_variance(points);
    if variance < 15.0 {
        return FlightPattern::Linear;
    }

    // Consistent turning: the mean signed heading delta stays one-sided
    let mut total_turn = 0.0;
    for i in 1..points.len() {
        total_turn += norm_delta(points[i].heading as f64 - points[i - 1].heading as f64);
    }
    let avg_turn = total_turn / (points.len() - 1) as f64;
    if avg_turn.abs() > 5.0 && variance < 30.0 {
        return FlightPattern::Circular;
    }

    // Patrol legs show up as sharp reversals between otherwise steady runs
    let mut direction_changes = 0usize;
    for i in 2..points.len() {
        let h1 = norm_delta(points[i - 1].heading as f64 - points[i - 2].heading as f64);
        let h2 = norm_delta(points[i].heading as f64 - points[i - 1].heading as f64);
        if (h2 - h1).abs() > 90.0 {
            direction_changes += 1;
        }
    }
    if direction_changes >= 2 && direction_changes <= points.len() / 5 {
        return FlightPattern::Patrol;
    }

    if variance > 60.0 {
        return FlightPattern::Erratic;
    }

    FlightPattern::Unknown
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;

    fn loc(lat: f64, lon: f64, alt: f32, speed: f32, heading: f32) -> Location {
        Location {
            valid: true,
            latitude: lat,
            longitude: lon,
            altitude_geo: alt,
            speed_horizontal: speed,
            direction: heading,
            ..Location::default()
        }
    }

    /// Feed a northbound track: `step_m` meters every `dt_ms`.
    fn feed_linear(
        analyzer: &mut TrajectoryAnalyzer,
        id: &str,
        n: usize,
        step_m: f64,
        dt_ms: u64,
        t0: Instant,
    ) {
        for i in 0..n {
            let lat = 37.0 + i as f64 * step_m / 111_195.0;
            let speed = step_m as f32 / (dt_ms as f32 / 1000.0);
            analyzer.add_position_at(
                id,
                &loc(lat, -122.0, 100.0, speed, 0.0),
                t0 + Duration::from_millis(i as u64 * dt_ms),
            );
        }
    }

    #[test]
    fn test_invalid_location_ignored() {
        let mut analyzer = TrajectoryAnalyzer::new();
        analyzer.add_position("UAV1", &Location::default());
        assert!(analyzer.trajectory("UAV1").is_none());
    }

    #[test]
    fn test_min_movement_filter() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();

        analyzer.add_position_at("UAV1", &loc(37.0, -122.0, 100.0, 0.0, 0.0), t0);
        // 10 cm away: below the 1 m threshold
        analyzer.add_position_at(
            "UAV1",
            &loc(37.0 + 0.1 / 111_195.0, -122.0, 100.0, 0.0, 0.0),
            t0 + Duration::from_millis(100),
        );

        assert_eq!(analyzer.trajectory("UAV1").unwrap().points.len(), 1);
    }

    #[test]
    fn test_points_recorded_and_smoothed() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();
        feed_linear(&mut analyzer, "UAV1", 5, 10.0, 1000, t0);

        let traj = analyzer.trajectory("UAV1").unwrap();
        assert_eq!(traj.points.len(), 5);
        assert_eq!(traj.smoothed_points.len(), 5);

        // Smoothed track lags the raw one
        let raw_last = traj.points.back().unwrap();
        let smooth_last = traj.smoothed_points.back().unwrap();
        assert!(smooth_last.latitude < raw_last.latitude);
    }

    #[test]
    fn test_history_bounded() {
        let mut analyzer = TrajectoryAnalyzer::with_config(TrajectoryConfig {
            max_history_points: 50,
            ..TrajectoryConfig::default()
        });
        let t0 = Instant::now();
        feed_linear(&mut analyzer, "UAV1", 120, 10.0, 1000, t0);

        let traj = analyzer.trajectory("UAV1").unwrap();
        assert_eq!(traj.points.len(), 50);
        assert_eq!(traj.smoothed_points.len(), 50);
    }

    #[test]
    fn test_stats_on_linear_track() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();
        // 20 points, 10 m apart, 1 s apart: stats recompute at point 20
        feed_linear(&mut analyzer, "UAV1", 20, 10.0, 1000, t0);

        let stats = analyzer.stats("UAV1");
        assert_eq!(stats.point_count, 20);
        assert!((stats.total_distance_m - 190.0).abs() < 2.0, "{stats:?}");
        assert!((stats.avg_speed_mps - 10.0).abs() < 0.1);
        assert!((stats.max_speed_mps - 10.0).abs() < 0.1);
        assert_eq!(stats.duration, Duration::from_secs(19));
        assert!(stats.heading_variance < 1.0);
    }

    #[test]
    fn test_predict_too_few_points() {
        let analyzer = TrajectoryAnalyzer::new();
        assert_eq!(analyzer.predict_position("nobody", 5000).confidence, 0.0);

        let mut analyzer = TrajectoryAnalyzer::new();
        analyzer.add_position("UAV1", &loc(37.0, -122.0, 100.0, 5.0, 0.0));
        assert_eq!(analyzer.predict_position("UAV1", 5000).confidence, 0.0);
    }

    #[test]
    fn test_predict_linear_motion() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();
        feed_linear(&mut analyzer, "UAV1", 10, 10.0, 1000, t0);

        let pred = analyzer.predict_position("UAV1", 5000);
        assert!(pred.confidence > 0.0);

        // Smoothed speed converges near 10 m/s northbound; after 5 s the
        // prediction should sit tens of meters further north
        let traj = analyzer.trajectory("UAV1").unwrap();
        let last = traj.smoothed_points.back().unwrap();
        let advanced = geo::distance_m(last.latitude, last.longitude, pred.latitude, pred.longitude);
        assert!(advanced > 20.0 && advanced < 80.0, "advanced {advanced}");
        assert!(pred.latitude > last.latitude);

        // Confidence = 1 - 5/30
        assert!((pred.confidence - (1.0 - 5.0 / 30.0)).abs() < 1e-9);
        assert!(pred.error_radius_m > 0.0);
    }

    #[test]
    fn test_predict_altitude_interpolation() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();

        // Climbing 2 m/s while moving north
        for i in 0..5u64 {
            let lat = 37.0 + i as f64 * 10.0 / 111_195.0;
            analyzer.add_position_at(
                "UAV1",
                &loc(lat, -122.0, 100.0 + i as f32 * 2.0, 10.0, 0.0),
                t0 + Duration::from_secs(i),
            );
        }

        let pred = analyzer.predict_position("UAV1", 5000);
        let last_alt = analyzer
            .trajectory("UAV1")
            .unwrap()
            .smoothed_points
            .back()
            .unwrap()
            .altitude;
        assert!(pred.altitude > last_alt, "altitude should keep climbing");
    }

    #[test]
    fn test_pattern_stationary() {
        let mut analyzer = TrajectoryAnalyzer::with_config(TrajectoryConfig {
            min_movement_m: 0.0,
            ..TrajectoryConfig::default()
        });
        let t0 = Instant::now();

        for i in 0..10u64 {
            // Hovering: tiny jitter, near-zero reported speed
            let lat = 37.0 + (i % 2) as f64 * 2.0 / 111_195.0;
            analyzer.add_position_at(
                "UAV1",
                &loc(lat, -122.0, 50.0, 0.1, (i * 37 % 360) as f32),
                t0 + Duration::from_secs(i),
            );
        }
        assert_eq!(analyzer.classify_pattern("UAV1"), FlightPattern::Stationary);
    }

    #[test]
    fn test_pattern_linear() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();
        feed_linear(&mut analyzer, "UAV1", 10, 10.0, 1000, t0);
        assert_eq!(analyzer.classify_pattern("UAV1"), FlightPattern::Linear);
    }

    #[test]
    fn test_pattern_circular() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();

        // Constant 10°-per-step turn around a small circle
        for i in 0..10u64 {
            let angle = (i as f64 * 10.0).to_radians();
            let lat = 37.0 + 50.0 * angle.cos() / 111_195.0;
            let lon = -122.0 + 50.0 * angle.sin() / 111_195.0;
            let heading = ((i as f32 * 10.0) + 90.0) % 360.0;
            analyzer.add_position_at(
                "UAV1",
                &loc(lat, lon, 80.0, 8.0, heading),
                t0 + Duration::from_secs(i),
            );
        }
        assert_eq!(analyzer.classify_pattern("UAV1"), FlightPattern::Circular);
    }

    #[test]
    fn test_pattern_landing() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();

        for i in 0..10u64 {
            let lat = 37.0 + i as f64 * 3.0 / 111_195.0;
            analyzer.add_position_at(
                "UAV1",
                &loc(lat, -122.0, 60.0 - i as f32 * 5.0, 3.0, 0.0),
                t0 + Duration::from_secs(i),
            );
        }
        // Descending more than 10 m at low speed, but heading is steady: the
        // altitude cue must win before the linear check
        assert_eq!(analyzer.classify_pattern("UAV1"), FlightPattern::Landing);
    }

    #[test]
    fn test_pattern_takeoff() {
        let mut analyzer = TrajectoryAnalyzer::new();
        let t0 = Instant::now();

        for i in 0..10u64 {
            let lat = 37.0 + i as f64 * 3.0 / 111_195.0;
            analyzer.add_position_at(
                "UAV1",
                &loc(lat, -122.0, 5.0 + i as f32 * 5.0, 3.0, 0.0),
                t0 + Duration::from_secs(i),
            );
        }
        assert_eq!(analyzer.classify_pattern("UAV1"), FlightPattern::Takeoff);
    }

    #[test]
    fn test_static_helpers_consistent() {
        let d = TrajectoryAnalyzer::distance(37.0, -122.0, 38.0, -122.0);
        assert!((d - 111_195.0).abs() < 200.0);

        let b = TrajectoryAnalyzer::bearing(37.0, -122.0, 38.0, -122.0);
        assert!(b.abs() < 0.01);

        let (lat, lon) = TrajectoryAnalyzer::project(37.0, -122.0, 0.0, 1000.0);
        let back = TrajectoryAnalyzer::distance(37.0, -122.0, lat, lon);
        assert!((back - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_clear_uav() {
        let mut analyzer = TrajectoryAnalyzer::new();
        analyzer.add_position("UAV1", &loc(37.0, -122.0, 100.0, 5.0, 0.0));
        assert_eq!(analyzer.tracked_uavs(), vec!["UAV1".to_string()]);

        analyzer.clear_uav("UAV1");
        assert!(analyzer.trajectory("UAV1").is_none());
        assert!(analyzer.tracked_uavs().is_empty());
    }
}
