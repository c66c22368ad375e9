//! Unit tests for the `TeleinfoError` enum and its associated `Display` trait implementation.

use teleinfo_rs::error::TeleinfoError;

/// Tests that the `SerialPortError` variant is correctly formatted.
#[test]
fn test_serial_port_error() {
    let err = TeleinfoError::SerialPortError("Test error".to_string());
    assert_eq!(err.to_string(), "Serial port error: Test error");
}

/// Tests that the `StreamClosed` variant is correctly formatted.
#[test]
fn test_stream_closed_error() {
    assert_eq!(TeleinfoError::StreamClosed.to_string(), "Byte source closed");
}

/// Tests that the `InvalidValue` variant is correctly formatted.
#[test]
fn test_invalid_value_error() {
    let err = TeleinfoError::InvalidValue {
        label: "IINST".to_string(),
        value: "00A".to_string(),
    };
    assert_eq!(err.to_string(), "Invalid value for IINST: \"00A\"");
}

/// Tests that the `HttpError` variant is correctly formatted.
#[test]
fn test_http_error() {
    let err = TeleinfoError::HttpError("status 500".to_string());
    assert_eq!(err.to_string(), "HTTP error: status 500");
}

/// Tests that the `InvalidUrl` variant is correctly formatted.
#[test]
fn test_invalid_url_error() {
    let err = TeleinfoError::InvalidUrl("ftp://x".to_string());
    assert_eq!(err.to_string(), "Invalid URL: ftp://x");
}

/// Tests that the `ConfigError` variant is correctly formatted.
#[test]
fn test_config_error() {
    let err = TeleinfoError::ConfigError("bad".to_string());
    assert_eq!(err.to_string(), "Configuration error: bad");
}

/// Tests that the `InvalidHexString` variant is correctly formatted.
#[test]
fn test_invalid_hex_string_error() {
    let err = TeleinfoError::InvalidHexString;
    assert_eq!(err.to_string(), "Invalid hexadecimal string");
}

/// Tests that the `Other` variant is correctly formatted.
#[test]
fn test_other_error() {
    let err = TeleinfoError::Other("Test error message".to_string());
    assert_eq!(err.to_string(), "Other error: Test error message");
}

/// I/O failures of the byte source map to `SerialPortError`.
#[test]
fn test_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such device");
    let err: TeleinfoError = io.into();
    assert!(matches!(err, TeleinfoError::SerialPortError(ref m) if m == "no such device"));
}
