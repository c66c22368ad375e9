//! # Teleinfo Frame Decoder
//!
//! The meter repeats its information groups continuously. Each group is a line:
//!
//! ```text
//! LF  LABEL  SP  VALUE  SP  CHECKSUM  CR
//! ```
//!
//! where `CHECKSUM = ((sum(LABEL) + sum(VALUE) + SP) & 0x3F) + 0x20`.
//!
//! The decoder synchronizes on the line feed, reads two space-terminated
//! words and compares the next character with the computed checksum. A
//! mismatch is not an error: the line is dropped and decoding resumes at the
//! next line feed. Only the byte source itself can end the stream.
//!
//! ## Usage
//!
//! Decoding a captured buffer:
//! ```rust
//! use teleinfo_rs::teleinfo::frame::{decode_bytes, encode_group};
//!
//! let capture = encode_group("PAPP", "00750");
//! let records = decode_bytes(&capture);
//! assert_eq!(records[0].label, "PAPP");
//! assert_eq!(records[0].value, "00750");
//! ```

use crate::constants::{
    TELEINFO_CHECKSUM_MASK, TELEINFO_CHECKSUM_OFFSET, TELEINFO_LINE_FEED, TELEINFO_SPACE,
};
use crate::error::TeleinfoError;
use crate::teleinfo::parity::{validate_byte, with_even_parity, ByteValidator};
use crate::util::logging::{log_line_hex, LogThrottle};
use tokio::io::AsyncRead;

/// Longest word accepted before the line is considered garbage.
pub const MAX_WORD_LEN: usize = 64;

/// A label/value pair whose checksum has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub label: String,
    pub value: String,
}

impl Record {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Record {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Why a line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The character after the value did not match the computed checksum.
    ChecksumMismatch { expected: u8, received: u8 },
    /// A word grew beyond [`MAX_WORD_LEN`] without a separator.
    WordTooLong,
}

/// Result of feeding the decoder up to the end of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Record(Record),
    Discarded(DiscardReason),
}

/// Running counters of the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub records: u64,
    pub discarded: u64,
    pub parity_errors: u64,
}

/// Computes the checksum character of a label/value pair.
pub fn checksum(label: &str, value: &str) -> u8 {
    let sum = label
        .bytes()
        .chain(value.bytes())
        .fold(TELEINFO_SPACE as u32, |acc, b| acc + b as u32);
    (sum & TELEINFO_CHECKSUM_MASK) as u8 + TELEINFO_CHECKSUM_OFFSET
}

/// Builds the wire bytes of one information group, parity bits included.
///
/// Handy for simulators and tests; the line is `LF label SP value SP checksum CR`.
pub fn encode_group(label: &str, value: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(label.len() + value.len() + 5);
    line.push(TELEINFO_LINE_FEED);
    line.extend_from_slice(label.as_bytes());
    line.push(TELEINFO_SPACE);
    line.extend_from_slice(value.as_bytes());
    line.push(TELEINFO_SPACE);
    line.push(checksum(label, value));
    line.push(b'\r');
    line.into_iter().map(with_even_parity).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Syncing,
    Label,
    Value,
    Checksum,
}

/// Incremental line decoder working on parity-stripped characters.
#[derive(Debug)]
pub struct LineDecoder {
    state: LineState,
    label: String,
    value: String,
    stats: DecoderStats,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        LineDecoder {
            state: LineState::Syncing,
            label: String::new(),
            value: String::new(),
            stats: DecoderStats::default(),
        }
    }

    /// Feeds one character; returns an outcome once a line is complete.
    pub fn push(&mut self, ch: u8) -> Option<DecodeOutcome> {
        match self.state {
            LineState::Syncing => {
                if ch == TELEINFO_LINE_FEED {
                    self.label.clear();
                    self.value.clear();
                    self.state = LineState::Label;
                }
                None
            }
            LineState::Label => {
                if ch == TELEINFO_SPACE {
                    self.state = LineState::Value;
                    None
                } else {
                    Self::push_word(&mut self.label, ch).then(|| self.discard(DiscardReason::WordTooLong))
                }
            }
            LineState::Value => {
                if ch == TELEINFO_SPACE {
                    self.state = LineState::Checksum;
                    None
                } else {
                    Self::push_word(&mut self.value, ch).then(|| self.discard(DiscardReason::WordTooLong))
                }
            }
            LineState::Checksum => {
                self.state = LineState::Syncing;
                let expected = checksum(&self.label, &self.value);
                if ch == expected {
                    self.stats.records += 1;
                    Some(DecodeOutcome::Record(Record {
                        label: std::mem::take(&mut self.label),
                        value: std::mem::take(&mut self.value),
                    }))
                } else {
                    Some(self.discard(DiscardReason::ChecksumMismatch {
                        expected,
                        received: ch,
                    }))
                }
            }
        }
    }

    /// Appends to a word; true when the word overflowed.
    fn push_word(word: &mut String, ch: u8) -> bool {
        if word.len() >= MAX_WORD_LEN {
            return true;
        }
        word.push(char::from(ch));
        false
    }

    fn discard(&mut self, reason: DiscardReason) -> DecodeOutcome {
        self.state = LineState::Syncing;
        self.stats.discarded += 1;
        DecodeOutcome::Discarded(reason)
    }

    /// The partially decoded line, for diagnostics.
    pub fn current_line(&self) -> String {
        format!("{} {}", self.label, self.value)
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}

/// Decodes every valid record of a captured raw byte buffer.
pub fn decode_bytes(data: &[u8]) -> Vec<Record> {
    let mut decoder = LineDecoder::new();
    data.iter()
        .filter_map(|&b| validate_byte(b))
        .filter_map(|ch| match decoder.push(ch) {
            Some(DecodeOutcome::Record(record)) => Some(record),
            _ => None,
        })
        .collect()
}

/// Lazily decodes records from an asynchronous byte source.
pub struct FrameDecoder<R> {
    validator: ByteValidator<R>,
    line: LineDecoder,
    throttle: LogThrottle,
}

impl<R: AsyncRead + Unpin> FrameDecoder<R> {
    pub fn new(source: R) -> Self {
        FrameDecoder {
            validator: ByteValidator::new(source),
            line: LineDecoder::new(),
            throttle: LogThrottle::new(10_000, 5),
        }
    }

    /// Reads until the next line is complete, whether accepted or not.
    pub async fn next_outcome(&mut self) -> Result<DecodeOutcome, TeleinfoError> {
        loop {
            let ch = self.validator.next_valid_byte().await?;
            let partial = (self.line.state == LineState::Checksum).then(|| self.line.current_line());
            if let Some(outcome) = self.line.push(ch) {
                if let DecodeOutcome::Discarded(reason) = &outcome {
                    if self.throttle.allow() {
                        log::debug!("Discarded teleinfo line: {reason:?}");
                        if let Some(line) = partial {
                            log_line_hex("Discarded line", line.as_bytes());
                        }
                    }
                }
                return Ok(outcome);
            }
        }
    }

    /// Returns the next record with a valid checksum.
    pub async fn next_record(&mut self) -> Result<Record, TeleinfoError> {
        loop {
            if let DecodeOutcome::Record(record) = self.next_outcome().await? {
                return Ok(record);
            }
        }
    }

    pub fn stats(&self) -> DecoderStats {
        DecoderStats {
            parity_errors: self.validator.rejected(),
            ..self.line.stats()
        }
    }
}
