//! # teleinfo-rs - Electric Meter Teleinfo to Domoticz Bridge
//!
//! The teleinfo-rs crate decodes the customer information output ("teleinfo")
//! of French electricity meters and forwards the readings to Domoticz virtual
//! sensors, with controlled transmission cadence.
//!
//! ## Features
//!
//! - Parity checking of the raw 1200 baud serial stream
//! - Resynchronizing line decoder with checksum validation
//! - Shared, lock-protected current / apparent power / index readings
//! - Per-sensor debounced transmission with optional heartbeat
//! - Domoticz HTTP client, device status queries and log messages
//! - Offline decoding of captured traffic
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use teleinfo_rs::{
//!     BridgeConfig, DomoticzClient, Teleinfo, TeleinfoError, TeleinfoOptions,
//! };
//!
//! # async fn run() -> Result<(), TeleinfoError> {
//! let config = BridgeConfig::load("teleinfo.toml".as_ref())?;
//! let client = DomoticzClient::new(&config.domoticz.base_url, Duration::from_secs(5))?;
//! let options = TeleinfoOptions::from_config(&config.sensors, Arc::new(client))?;
//! let session = Teleinfo::open(&config.serial.device, options)?;
//! session.join().await
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod domoticz;
pub mod error;
pub mod logging;
pub mod teleinfo;
pub mod util;

pub use crate::config::BridgeConfig;
pub use crate::error::TeleinfoError;
pub use crate::logging::{init_logger, log_info};

// Meter side
pub use teleinfo::{
    decode_bytes, MeasurementSnapshot, MeasurementState, Record, Teleinfo, TeleinfoOptions,
};

// Backend side
pub use domoticz::{
    DeviceStatus, DomoticzClient, DomoticzLog, JobConfig, PushSink, SensorJob, SensorKind,
    SensorValues,
};

/// Opens the meter's serial port and starts a decode session.
///
/// # Arguments
/// * `device` - Serial port path (e.g., "/dev/ttyAMA0")
/// * `options` - Sensor jobs and callback fed by the decode loop
pub fn open(device: &str, options: TeleinfoOptions) -> Result<Teleinfo, TeleinfoError> {
    Teleinfo::open(device, options)
}
