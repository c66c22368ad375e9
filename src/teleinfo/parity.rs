//! # Byte Validator
//!
//! Teleinfo characters travel as 7 data bits plus an even parity bit. The port
//! is opened in raw 8-bit mode and parity is checked here, so a corrupted
//! character is simply dropped instead of aborting the read.

use crate::constants::TELEINFO_DATA_MASK;
use crate::error::TeleinfoError;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// True when the byte has an even number of set bits across all 8 bits.
#[inline]
pub fn has_even_parity(byte: u8) -> bool {
    byte.count_ones() % 2 == 0
}

/// Strips the parity bit of a valid byte, `None` when the parity is wrong.
#[inline]
pub fn validate_byte(byte: u8) -> Option<u8> {
    has_even_parity(byte).then_some(byte & TELEINFO_DATA_MASK)
}

/// Sets the high bit of a 7-bit character so that the byte has even parity.
#[inline]
pub fn with_even_parity(ch: u8) -> u8 {
    let ch = ch & TELEINFO_DATA_MASK;
    if has_even_parity(ch) {
        ch
    } else {
        ch | 0x80
    }
}

/// Reads parity-checked characters from an asynchronous byte source.
pub struct ByteValidator<R> {
    source: BufReader<R>,
    rejected: u64,
}

impl<R: AsyncRead + Unpin> ByteValidator<R> {
    pub fn new(source: R) -> Self {
        ByteValidator {
            source: BufReader::new(source),
            rejected: 0,
        }
    }

    /// Waits for the next byte with even parity and returns its low 7 bits.
    ///
    /// Odd-parity bytes are discarded silently. The only errors are those of
    /// the byte source itself: an I/O failure or the end of the stream.
    pub async fn next_valid_byte(&mut self) -> Result<u8, TeleinfoError> {
        let mut buf = [0u8; 1];
        loop {
            let n = self.source.read(&mut buf).await?;
            if n == 0 {
                return Err(TeleinfoError::StreamClosed);
            }
            match validate_byte(buf[0]) {
                Some(ch) => return Ok(ch),
                None => self.rejected += 1,
            }
        }
    }

    /// Number of bytes dropped for bad parity so far.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
