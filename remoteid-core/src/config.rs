//! Configuration file management for remoteid-decode.
//!
//! Reads/writes `~/.remoteid-decode/config.yaml` with parser, anomaly, and
//! trajectory tunables. A missing or unreadable file yields defaults.

use std::path::PathBuf;

use crate::anomaly::AnomalyConfig;
use crate::parser::ParserConfig;
use crate::trajectory::TrajectoryConfig;
use crate::types::RidError;

/// Full configuration structure.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub parser: ParserConfig,
    pub anomaly: AnomalyConfig,
    pub trajectory: TrajectoryConfig,
}

/// Get the config directory path (`~/.remoteid-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".remoteid-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.remoteid-decode/config.yaml`.
///
/// Returns default config if the file doesn't exist.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    parse_config(&text)
}

/// Save config to `~/.remoteid-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, RidError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|_| RidError::InvalidArgument("config directory"))?;

    let path = config_file();
    let text = serialize_config(config);
    std::fs::write(&path, text).map_err(|_| RidError::InvalidArgument("config file"))?;

    Ok(path)
}

/// Parse simple YAML-like config text.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            if val.is_empty() {
                current_section = Some(key.to_string());
            } else {
                current_section = None;
            }
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            continue;
        };
        match section {
            "parser" => match key {
                "timeout_ms" => set_u32(&mut config.parser.uav_timeout_ms, val),
                "deduplication" => set_bool(&mut config.parser.enable_deduplication, val),
                "astm" => set_bool(&mut config.parser.enable_astm, val),
                "asd" => set_bool(&mut config.parser.enable_asd, val),
                "cn" => set_bool(&mut config.parser.enable_cn, val),
                _ => {}
            },
            "anomaly" => match key {
                "max_horizontal_speed" => set_f32(&mut config.anomaly.max_horizontal_speed, val),
                "max_vertical_speed" => set_f32(&mut config.anomaly.max_vertical_speed, val),
                "max_acceleration" => set_f32(&mut config.anomaly.max_acceleration, val),
                "max_position_jump_m" => set_f64(&mut config.anomaly.max_position_jump_m, val),
                "replay_window_ms" => set_u32(&mut config.anomaly.replay_window_ms, val),
                "min_duplicate_count" => {
                    if let Ok(v) = val.parse::<usize>() {
                        config.anomaly.min_duplicate_count = v;
                    }
                }
                "min_rssi_change" => {
                    if let Ok(v) = val.parse::<i8>() {
                        config.anomaly.min_rssi_change = v;
                    }
                }
                "max_timestamp_gap_ms" => set_u32(&mut config.anomaly.max_timestamp_gap_ms, val),
                _ => {}
            },
            "trajectory" => match key {
                "max_history_points" => {
                    if let Ok(v) = val.parse::<usize>() {
                        config.trajectory.max_history_points = v;
                    }
                }
                "smoothing_factor" => set_f64(&mut config.trajectory.smoothing_factor, val),
                "prediction_horizon_ms" => {
                    set_u32(&mut config.trajectory.prediction_horizon_ms, val)
                }
                "min_movement_m" => set_f64(&mut config.trajectory.min_movement_m, val),
                "stationary_speed_threshold" => {
                    set_f32(&mut config.trajectory.stationary_speed_threshold, val)
                }
                _ => {}
            },
            _ => {}
        }
    }

    config
}

fn set_u32(target: &mut u32, val: &str) {
    if let Ok(v) = val.parse::<u32>() {
        *target = v;
    }
}

fn set_f32(target: &mut f32, val: &str) {
    if let Ok(v) = val.parse::<f32>() {
        *target = v;
    }
}

fn set_f64(target: &mut f64, val: &str) {
    if let Ok(v) = val.parse::<f64>() {
        *target = v;
    }
}

fn set_bool(target: &mut bool, val: &str) {
    match val {
        "true" | "yes" | "on" => *target = true,
        "false" | "no" | "off" => *target = false,
        _ => {}
    }
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# remoteid-decode configuration".to_string(), String::new()];

    lines.push("parser:".into());
    lines.push(format!("  timeout_ms: {}", config.parser.uav_timeout_ms));
    lines.push(format!(
        "  deduplication: {}",
        config.parser.enable_deduplication
    ));
    lines.push(format!("  astm: {}", config.parser.enable_astm));
    lines.push(format!("  asd: {}", config.parser.enable_asd));
    lines.push(format!("  cn: {}", config.parser.enable_cn));
    lines.push(String::new());

    lines.push("anomaly:".into());
    lines.push(format!(
        "  max_horizontal_speed: {}",
        config.anomaly.max_horizontal_speed
    ));
    lines.push(format!(
        "  max_vertical_speed: {}",
        config.anomaly.max_vertical_speed
    ));
    lines.push(format!(
        "  max_acceleration: {}",
        config.anomaly.max_acceleration
    ));
    lines.push(format!(
        "  max_position_jump_m: {}",
        config.anomaly.max_position_jump_m
    ));
    lines.push(format!(
        "  replay_window_ms: {}",
        config.anomaly.replay_window_ms
    ));
    lines.push(format!(
        "  min_duplicate_count: {}",
        config.anomaly.min_duplicate_count
    ));
    lines.push(format!(
        "  min_rssi_change: {}",
        config.anomaly.min_rssi_change
    ));
    lines.push(format!(
        "  max_timestamp_gap_ms: {}",
        config.anomaly.max_timestamp_gap_ms
    ));
    lines.push(String::new());

    lines.push("trajectory:".into());
    lines.push(format!(
        "  max_history_points: {}",
        config.trajectory.max_history_points
    ));
    lines.push(format!(
        "  smoothing_factor: {}",
        config.trajectory.smoothing_factor
    ));
    lines.push(format!(
        "  prediction_horizon_ms: {}",
        config.trajectory.prediction_horizon_ms
    ));
    lines.push(format!(
        "  min_movement_m: {}",
        config.trajectory.min_movement_m
    ));
    lines.push(format!(
        "  stationary_speed_threshold: {}",
        config.trajectory.stationary_speed_threshold
    ));
    lines.push(String::new());

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.parser.uav_timeout_ms, 30_000);
        assert!(config.parser.enable_astm);
        assert!(!config.parser.enable_asd);
        assert_eq!(config.anomaly.replay_window_ms, 5000);
        assert_eq!(config.trajectory.max_history_points, 1000);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
parser:
  timeout_ms: 60000
  deduplication: off
  asd: true

anomaly:
  max_horizontal_speed: 90.5
  min_duplicate_count: 5

trajectory:
  smoothing_factor: 0.5
  max_history_points: 200
"#;
        let config = parse_config(text);
        assert_eq!(config.parser.uav_timeout_ms, 60_000);
        assert!(!config.parser.enable_deduplication);
        assert!(config.parser.enable_asd);
        assert!(config.parser.enable_astm); // untouched default
        assert!((config.anomaly.max_horizontal_speed - 90.5).abs() < f32::EPSILON);
        assert_eq!(config.anomaly.min_duplicate_count, 5);
        assert!((config.trajectory.smoothing_factor - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.trajectory.max_history_points, 200);
    }

    #[test]
    fn test_parse_garbage_keeps_defaults() {
        let config = parse_config("parser:\n  timeout_ms: banana\nnot yaml at all\n");
        assert_eq!(config.parser.uav_timeout_ms, 30_000);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.parser.uav_timeout_ms = 12_345;
        config.parser.enable_asd = true;
        config.anomaly.max_acceleration = 12.5;
        config.trajectory.min_movement_m = 2.0;

        let text = serialize_config(&config);
        let parsed = parse_config(&text);
        assert_eq!(parsed.parser.uav_timeout_ms, 12_345);
        assert!(parsed.parser.enable_asd);
        assert!((parsed.anomaly.max_acceleration - 12.5).abs() < f32::EPSILON);
        assert!((parsed.trajectory.min_movement_m - 2.0).abs() < f64::EPSILON);
    }
}
