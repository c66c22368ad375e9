//! Tests for loading the bridge configuration file.

use std::io::Write;
use tempfile::NamedTempFile;
use teleinfo_rs::error::TeleinfoError;
use teleinfo_rs::BridgeConfig;

#[test]
fn test_defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.serial.device, "/dev/ttyAMA0");
    assert_eq!(config.serial.baudrate, 1200);
    assert_eq!(config.domoticz.base_url, "http://127.0.0.1:8080/json.htm");
    assert_eq!(config.domoticz.timeout_secs, 5);
    assert_eq!(config.sensors.update_period_secs, 20);
    assert_eq!(config.sensors.heartbeat_secs, 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_full_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[serial]
device = "/dev/ttyUSB0"

[domoticz]
base_url = "http://192.168.1.10:8080/json.htm"
timeout_secs = 3

[sensors]
counter_idx = 12
current_idx = 13
update_period_secs = 30
heartbeat_secs = 300
"#
    )
    .unwrap();

    let config = BridgeConfig::load(file.path()).unwrap();
    assert_eq!(config.serial.device, "/dev/ttyUSB0");
    assert_eq!(config.serial.baudrate, 1200);
    assert_eq!(config.domoticz.base_url, "http://192.168.1.10:8080/json.htm");
    assert_eq!(config.domoticz.timeout_secs, 3);
    assert_eq!(config.sensors.counter_idx, 12);
    assert_eq!(config.sensors.current_idx, 13);
    assert_eq!(config.sensors.update_period_secs, 30);
    assert_eq!(config.sensors.heartbeat_secs, 300);
}

/// Missing sections fall back to their defaults.
#[test]
fn test_partial_file() {
    let config = BridgeConfig::parse("[sensors]\ncurrent_idx = 7\n").unwrap();
    assert_eq!(config.sensors.current_idx, 7);
    assert_eq!(config.sensors.counter_idx, 0);
    assert_eq!(config.serial, BridgeConfig::default().serial);
}

#[test]
fn test_invalid_values() {
    for text in [
        "[serial]\nbaudrate = 0\n",
        "[domoticz]\nbase_url = \"https://domoticz.lan/json.htm\"\n",
        "[sensors]\ncounter_idx = \"twelve\"\n",
        "not toml at all",
    ] {
        assert!(
            matches!(BridgeConfig::parse(text), Err(TeleinfoError::ConfigError(_))),
            "accepted {text:?}"
        );
    }
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match BridgeConfig::load(&path) {
        Err(TeleinfoError::ConfigError(msg)) => assert!(msg.contains("absent.toml")),
        other => panic!("unexpected result: {other:?}"),
    }
}
