//! # Hex Encoding/Decoding Utilities
//!
//! Captured teleinfo traffic is usually exchanged as hex dumps (logic analyzer
//! exports, `xxd -p` output, log lines). These helpers turn such dumps back
//! into bytes for offline decoding and format bytes for logs.
//!
//! ## Usage
//!
//! ```rust
//! use teleinfo_rs::util::hex::{decode_hex, format_hex_compact};
//!
//! let data = decode_hex("0a 49 49 4e 53 54").unwrap();
//! assert_eq!(data, b"\nIINST");
//! assert_eq!(format_hex_compact(&data[..2]), "0a 49");
//! ```

use crate::error::TeleinfoError;

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters. Whitespace and
/// `0x` prefixes are stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, TeleinfoError> {
    let cleaned: String = hex_str
        .split_whitespace()
        .map(|tok| tok.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();

    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return Err(TeleinfoError::InvalidHexString);
    }

    hex::decode(&cleaned).map_err(|_| TeleinfoError::InvalidHexString)
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "0a 49 49" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Printable rendering of a teleinfo line, control characters escaped.
pub fn escape_ascii(data: &[u8]) -> String {
    data.iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect()
}
