//! # Teleinfo Error Handling
//!
//! This module defines the TeleinfoError enum, which represents the different error
//! types that can occur in the teleinfo-rs crate.
//!
//! Framing problems on the serial line (parity failures, checksum mismatches)
//! never show up here: the decoder drops them and resynchronizes on the next line.

use thiserror::Error;

/// Represents the different error types that can occur in the teleinfo crate.
#[derive(Debug, Error)]
pub enum TeleinfoError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// The byte source reached end of stream.
    #[error("Byte source closed")]
    StreamClosed,

    /// A recognized label carried a value that is not a number.
    #[error("Invalid value for {label}: {value:?}")]
    InvalidValue { label: String, value: String },

    /// Indicates a failed request to the home-automation backend.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Indicates a malformed backend URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with a body we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Indicates an unreadable or inconsistent configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TeleinfoError>;

impl From<std::io::Error> for TeleinfoError {
    fn from(e: std::io::Error) -> Self {
        TeleinfoError::SerialPortError(e.to_string())
    }
}
