//! Bridge configuration, read from a TOML file.
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyAMA0"
//!
//! [domoticz]
//! base_url = "http://127.0.0.1:8080/json.htm"
//!
//! [sensors]
//! counter_idx = 12
//! current_idx = 13
//! update_period_secs = 20
//! heartbeat_secs = 300
//! ```
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_SERIAL_DEVICE, DEFAULT_UPDATE_PERIOD_SECS,
    DOMOTICZ_BASE_URL, TELEINFO_BAUDRATE,
};
use crate::error::TeleinfoError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialSection {
    pub device: String,
    pub baudrate: u32,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            device: DEFAULT_SERIAL_DEVICE.into(),
            baudrate: TELEINFO_BAUDRATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DomoticzSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for DomoticzSection {
    fn default() -> Self {
        Self {
            base_url: DOMOTICZ_BASE_URL.into(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Which Domoticz devices get updated, and how often.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorsConfig {
    /// Electric counter device (power + index); 0 disables it.
    pub counter_idx: u32,
    /// Current sensor device; 0 disables it.
    pub current_idx: u32,
    /// Minimum interval between two updates of one device.
    pub update_period_secs: u64,
    /// Resend the last value after this long without change; 0 disables it.
    pub heartbeat_secs: u64,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            counter_idx: 0,
            current_idx: 0,
            update_period_secs: DEFAULT_UPDATE_PERIOD_SECS,
            heartbeat_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial: SerialSection,
    pub domoticz: DomoticzSection,
    pub sensors: SensorsConfig,
}

impl BridgeConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, TeleinfoError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TeleinfoError::ConfigError(format!("{}: {e}", path.display())))?;
        let config = Self::parse(&text)?;
        log::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, TeleinfoError> {
        let config: BridgeConfig =
            toml::from_str(text).map_err(|e| TeleinfoError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TeleinfoError> {
        if self.serial.baudrate == 0 {
            return Err(TeleinfoError::ConfigError("serial.baudrate must be > 0".into()));
        }
        if !self.domoticz.base_url.starts_with("http://") {
            return Err(TeleinfoError::ConfigError(format!(
                "domoticz.base_url must start with http:// (got {:?})",
                self.domoticz.base_url
            )));
        }
        if self.sensors.counter_idx == 0 && self.sensors.current_idx == 0 {
            log::warn!("No Domoticz sensor configured, readings will only be logged");
        }
        Ok(())
    }
}
