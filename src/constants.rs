//! Teleinfo Protocol Constants
//!
//! This module defines constants used by the teleinfo decoder (the customer
//! information output of French electricity meters) and by the Domoticz
//! HTTP/JSON interface the readings are forwarded to.

/// Line rate of the historic teleinfo output
pub const TELEINFO_BAUDRATE: u32 = 1200;

/// Line terminator that starts every information group
pub const TELEINFO_LINE_FEED: u8 = b'\n';

/// Separator between label, value and checksum
pub const TELEINFO_SPACE: u8 = b' ';

/// Mask applied to the character sum
pub const TELEINFO_CHECKSUM_MASK: u32 = 0x3F;

/// Offset added to the masked sum to make the checksum printable
pub const TELEINFO_CHECKSUM_OFFSET: u8 = 0x20;

/// Data bits carried by each character (the eighth bit is parity)
pub const TELEINFO_DATA_MASK: u8 = 0x7F;

/// Instantaneous current, in amperes
pub const LABEL_IINST: &str = "IINST";

/// Base option index, in Wh
pub const LABEL_BASE: &str = "BASE";

/// Apparent power, in VA
pub const LABEL_PAPP: &str = "PAPP";

/// Default serial device on a Raspberry Pi
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyAMA0";

/// Default Domoticz JSON endpoint
pub const DOMOTICZ_BASE_URL: &str = "http://127.0.0.1:8080/json.htm";

/// Placeholder replaced by the device index in request templates
pub const DOMOTICZ_IDX_PLACEHOLDER: &str = "IDX";

/// Placeholder replaced by a sensor value in request templates
pub const DOMOTICZ_VALUE_PLACEHOLDER: &str = "{}";

/// Switch on/off command
pub const PARAM_STRING_SWITCH: &str = "?type=command&param=switchlight&idx=IDX&switchcmd={}";

/// Selector switch level command
pub const PARAM_STRING_SELECTOR_SWITCH: &str =
    "?type=command&param=switchlight&idx=IDX&switchcmd=Set Level&level={}";

/// Current sensor update
pub const PARAM_STRING_CURRENT: &str = "?type=command&param=udevice&idx=IDX&nvalue=0&svalue={}";

/// Electric counter update (power;energy)
pub const PARAM_STRING_ELECTRIC_COUNTER: &str =
    "?type=command&param=udevice&idx=IDX&nvalue=0&svalue={};{}";

/// Text sensor update
pub const PARAM_STRING_TEXT: &str = "?type=command&param=udevice&idx=IDX&nvalue=0&svalue={}";

/// Log message request; the message is appended
pub const PARAM_STRING_LOG: &str = "?type=command&param=addlogmessage&message=";

/// Device status query; the device index is appended
pub const PARAM_STRING_DEVICE_STATUS: &str = "?type=devices&rid=";

/// Default minimum transmission interval for meter sensors, in seconds
pub const DEFAULT_UPDATE_PERIOD_SECS: u64 = 20;

/// Default HTTP timeout, in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
