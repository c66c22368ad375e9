//! # Utility Modules
//!
//! Hex dump handling and throttled logging shared by the decoder and the CLI.

pub mod hex;
pub mod logging;

pub use self::hex::{decode_hex, encode_hex, escape_ascii, format_hex_compact};
pub use self::logging::{log_line_hex, LogThrottle};
