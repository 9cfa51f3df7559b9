//! remoteid-cli: decode and analyze drone Remote-ID captures.

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Table};
use tracing::debug;

use remoteid_core::config;
use remoteid_core::hex_decode;
use remoteid_core::trajectory::TrajectoryAnalyzer;
use remoteid_core::{
    AnomalyDetector, AnomalySeverity, ParserConfig, RemoteIdParser, TransportType, Uav,
};

#[derive(Parser)]
#[command(name = "remoteid", version, about = "Drone Remote-ID decoder and tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    BtLegacy,
    BtExtended,
    WifiBeacon,
    WifiNan,
}

impl From<TransportArg> for TransportType {
    fn from(t: TransportArg) -> Self {
        match t {
            TransportArg::BtLegacy => TransportType::BtLegacy,
            TransportArg::BtExtended => TransportType::BtExtended,
            TransportArg::WifiBeacon => TransportType::WifiBeacon,
            TransportArg::WifiNan => TransportType::WifiNan,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode hex frames from a capture file and print the aircraft seen
    Decode {
        /// Path to file containing hex frames, one per line ("-" for stdin).
        /// Lines may carry an RSSI suffix: "<hex>;<rssi_dbm>"
        file: PathBuf,

        /// Transport hint for all frames in the capture
        #[arg(short, long, value_enum, default_value = "bt-legacy")]
        transport: TransportArg,

        /// Emit the aircraft list as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Replay a capture through the anomaly and trajectory analyzers
    Analyze {
        /// Path to file containing hex frames, one per line ("-" for stdin)
        file: PathBuf,

        /// Transport hint for all frames in the capture
        #[arg(short, long, value_enum, default_value = "bt-legacy")]
        transport: TransportArg,
    },

    /// Write a config file with default settings
    InitConfig,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            file,
            transport,
            json,
        } => cmd_decode(file, transport.into(), json),
        Commands::Analyze { file, transport } => cmd_analyze(file, transport.into()),
        Commands::InitConfig => cmd_init_config(),
    }
}

fn open_reader(file: &PathBuf) -> Box<dyn BufRead> {
    if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(file).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    }
}

/// Parse a capture line: "<hex>" or "<hex>;<rssi_dbm>".
fn parse_line(line: &str) -> Option<(Vec<u8>, i8)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (hex_part, rssi) = match line.split_once(';') {
        Some((h, r)) => (h.trim(), r.trim().parse::<i8>().unwrap_or(-60)),
        None => (line, -60),
    };

    hex_decode(hex_part).map(|payload| (payload, rssi))
}

fn cmd_decode(file: PathBuf, transport: TransportType, json: bool) {
    let cfg = config::load_config();
    let mut parser = RemoteIdParser::with_config(cfg.parser);

    let mut total_frames = 0u64;
    let mut decoded_frames = 0u64;
    let mut remote_id_frames = 0u64;

    for line in open_reader(&file).lines() {
        let Ok(line) = line else { continue };
        let Some((payload, rssi)) = parse_line(&line) else {
            continue;
        };

        total_frames += 1;
        let result = parser.parse_bytes(&payload, rssi, transport);
        if result.is_remote_id {
            remote_id_frames += 1;
        }
        if result.success {
            decoded_frames += 1;
        } else if let Some(err) = result.error {
            debug!(frame = total_frames, %err, "frame failed to decode");
        }
    }

    let uavs = parser.active_uavs();

    if json {
        println!("{}", serde_json::to_string_pretty(&uavs).unwrap());
    } else {
        print_aircraft_table(&uavs);
        println!(
            "\n{total_frames} frames, {remote_id_frames} Remote ID, {decoded_frames} decoded, {} aircraft",
            uavs.len()
        );
    }
}

fn cmd_analyze(file: PathBuf, transport: TransportType) {
    let cfg = config::load_config();
    let mut parser = RemoteIdParser::with_config(ParserConfig {
        // Keep everything for the final report, regardless of capture gaps
        uav_timeout_ms: u32::MAX,
        ..cfg.parser
    });
    let mut detector = AnomalyDetector::with_config(cfg.anomaly);
    let mut trajectories = TrajectoryAnalyzer::with_config(cfg.trajectory);

    let mut total_frames = 0u64;
    let mut anomalies = Vec::new();

    for line in open_reader(&file).lines() {
        let Ok(line) = line else { continue };
        let Some((payload, rssi)) = parse_line(&line) else {
            continue;
        };

        total_frames += 1;
        let result = parser.parse_bytes(&payload, rssi, transport);
        let Some(uav) = result.uav else { continue };

        if !uav.id.is_empty() {
            anomalies.extend(detector.analyze(&uav, rssi));
            trajectories.add_position(&uav.id, &uav.location);
        }
    }

    let uavs = parser.active_uavs();
    print_aircraft_table(&uavs);

    println!();
    let mut pattern_table = Table::new();
    pattern_table.set_header(vec!["ID", "PATTERN", "DISTANCE (m)", "AVG SPEED (m/s)"]);
    for uav in &uavs {
        let stats = trajectories.stats(&uav.id);
        pattern_table.add_row(vec![
            Cell::new(&uav.id),
            Cell::new(format!("{:?}", trajectories.classify_pattern(&uav.id))),
            Cell::new(format!("{:.0}", stats.total_distance_m)),
            Cell::new(format!("{:.1}", stats.avg_speed_mps)),
        ]);
    }
    println!("{pattern_table}");

    if anomalies.is_empty() {
        println!("\n{total_frames} frames, no anomalies");
        return;
    }

    println!();
    let mut anomaly_table = Table::new();
    anomaly_table.set_header(vec!["ID", "KIND", "SEVERITY", "CONFIDENCE", "DETAIL"]);
    for a in &anomalies {
        let severity = match a.severity {
            AnomalySeverity::Info => "info",
            AnomalySeverity::Warning => "WARNING",
            AnomalySeverity::Critical => "CRITICAL",
        };
        anomaly_table.add_row(vec![
            Cell::new(&a.uav_id),
            Cell::new(format!("{:?}", a.kind)),
            Cell::new(severity),
            Cell::new(format!("{:.2}", a.confidence)),
            Cell::new(&a.description),
        ]);
    }
    println!("{anomaly_table}");
    println!(
        "\n{total_frames} frames, {} anomalies ({} total across run)",
        anomalies.len(),
        detector.total_anomalies()
    );
}

fn cmd_init_config() {
    match config::save_config(&config::Config::default()) {
        Ok(path) => println!("Wrote {}", path.display()),
        Err(e) => {
            eprintln!("Error writing config: {e}");
            std::process::exit(1);
        }
    }
}

fn print_aircraft_table(uavs: &[Uav]) {
    let mut table = Table::new();
    table.set_header(vec![
        "ID", "TYPE", "PROTO", "TRANSPORT", "RSSI", "LAT", "LON", "ALT (m)", "SPD (m/s)", "MSGS",
    ]);

    for uav in uavs {
        let (lat, lon, alt, spd) = if uav.location.valid {
            (
                format!("{:.5}", uav.location.latitude),
                format!("{:.5}", uav.location.longitude),
                format!("{:.1}", uav.location.altitude_geo),
                format!("{:.1}", uav.location.speed_horizontal),
            )
        } else {
            ("-".into(), "-".into(), "-".into(), "-".into())
        };

        table.add_row(vec![
            Cell::new(&uav.id),
            Cell::new(format!("{:?}", uav.uav_type)),
            Cell::new(format!("{:?}", uav.protocol)),
            Cell::new(format!("{:?}", uav.transport)),
            Cell::new(uav.rssi),
            Cell::new(lat),
            Cell::new(lon),
            Cell::new(alt),
            Cell::new(spd),
            Cell::new(uav.message_count),
        ]);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
