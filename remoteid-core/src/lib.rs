//! remoteid-core: Pure decode + tracking library for drone Remote ID.
//!
//! No async, no radio I/O — just the pipeline from captured advertisement
//! bytes to tracked aircraft: framing dissectors for BLE and Wi-Fi carriage,
//! the ASTM F3411 / ASD-STAN message decoders, a session registry with
//! lifecycle callbacks, and the anomaly/trajectory analyzers. This crate is
//! the shared core used by `remoteid-cli` and `remoteid-ffi`.

pub mod anomaly;
pub mod asd_stan;
pub mod astm;
pub mod bits;
pub mod cn_rid;
pub mod config;
pub mod geo;
pub mod parser;
pub mod session;
pub mod trajectory;
pub mod types;
pub mod wifi;

// Re-export commonly used types at crate root
pub use anomaly::{Anomaly, AnomalyConfig, AnomalyDetector, AnomalyKind, AnomalySeverity};
pub use parser::{ParserConfig, RemoteIdParser};
pub use session::SessionManager;
pub use trajectory::{FlightPattern, PredictedPosition, TrajectoryAnalyzer, TrajectoryConfig};
pub use types::*;
