//! Serial frame decoding
//!
//! A frame is one line of exactly [`FIELD_COUNT`] comma-separated base-10
//! integers. No quoting, no escaping. Tokens may carry surrounding ASCII
//! whitespace (the line terminator arrives as `\r\n` on most serial
//! bridges).
//!
//! Decoding is all-or-nothing: the token count is checked before any value
//! is parsed, every value is parsed and range-checked into a temporary, and
//! only a complete record is returned.

use core::num::IntErrorKind;

use crate::constants::FIELD_COUNT;
use crate::errors::DecodeError;

use super::record::StateRecord;

/// Decode one serial frame into a fresh [`StateRecord`]
pub fn decode(frame: &str) -> Result<StateRecord, DecodeError> {
    let frame = frame.trim();
    if frame.is_empty() {
        return Err(DecodeError::TooFewFields { found: 0 });
    }

    let found = frame.split(',').count();
    if found < FIELD_COUNT {
        return Err(DecodeError::TooFewFields { found });
    }
    if found > FIELD_COUNT {
        return Err(DecodeError::TooManyFields);
    }

    let mut values = [0i64; FIELD_COUNT];
    for (index, (slot, token)) in values.iter_mut().zip(frame.split(',')).enumerate() {
        *slot = parse_field(token, index)?;
    }

    StateRecord::from_values(&values)
}

fn parse_field(token: &str, index: usize) -> Result<i64, DecodeError> {
    token.trim().parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => DecodeError::OutOfRange { index },
        _ => DecodeError::NotNumeric { index },
    })
}
