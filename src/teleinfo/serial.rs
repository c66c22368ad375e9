//! # Teleinfo Serial Port
//!
//! The meter output is 7E1 at 1200 baud. The port is opened as raw 8N1 so the
//! parity bit reaches the [`ByteValidator`](crate::teleinfo::parity::ByteValidator),
//! which drops bad characters instead of failing the read.

use crate::constants::TELEINFO_BAUDRATE;
use crate::error::TeleinfoError;
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Configuration for serial connection.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baudrate: u32,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: TELEINFO_BAUDRATE,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Opens the serial device the meter is connected to.
pub fn open_port(device: &str, config: &SerialConfig) -> Result<SerialStream, TeleinfoError> {
    log::info!("Opening {device} at {} baud", config.baudrate);
    tokio_serial::new(device, config.baudrate)
        .data_bits(tokio_serial::DataBits::Eight)
        .stop_bits(tokio_serial::StopBits::One)
        .parity(tokio_serial::Parity::None)
        .timeout(config.timeout)
        .open_native_async()
        .map_err(|e| TeleinfoError::SerialPortError(format!("{device}: {e}")))
}
