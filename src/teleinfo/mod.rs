//! The teleinfo module contains the meter side of the bridge: parity checking
//! of the raw serial bytes, line decoding with checksum validation, and the
//! shared measurement state fed by the decode loop.

pub mod frame;
pub mod measurement;
pub mod parity;
pub mod reader;
pub mod serial;
pub mod serial_mock;
pub mod value;

pub use frame::{checksum, decode_bytes, DecodeOutcome, DecoderStats, FrameDecoder, Record};
pub use measurement::{MeasurementSnapshot, MeasurementState, Reading};
pub use parity::ByteValidator;
pub use reader::{Teleinfo, TeleinfoOptions};
