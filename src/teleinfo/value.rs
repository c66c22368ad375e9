//! Numeric values of teleinfo records.
//!
//! Meter readings are transmitted as zero-padded decimal words (`003`,
//! `007970353`). Anything else in a numeric field is rejected.

use crate::error::TeleinfoError;
use nom::character::complete::digit1;
use nom::combinator::{all_consuming, map_res};
use nom::IResult;

fn reading(input: &str) -> IResult<&str, u64> {
    all_consuming(map_res(digit1, str::parse::<u64>))(input)
}

/// Parses the value of a numeric record.
pub fn parse_reading(label: &str, value: &str) -> Result<u64, TeleinfoError> {
    reading(value)
        .map(|(_, n)| n)
        .map_err(|_| TeleinfoError::InvalidValue {
            label: label.to_string(),
            value: value.to_string(),
        })
}
