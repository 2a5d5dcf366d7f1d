//! Telemetry payload encoding
//!
//! Renders a [`StateRecord`] as a flat JSON object with a fixed key order:
//!
//! ```text
//! { "msgCount": 0, "sensor_1_type": 1, ..., "pwm_light": 5 }\0
//! ```
//!
//! The payload is built in a fixed buffer through `core::fmt::Write`, which
//! refuses any write that would not fit. Integers go through the same
//! bounded path, so there is no unchecked concatenation anywhere. A payload
//! that does not fit, NUL included, is reported as
//! [`EncodeError::BufferTooSmall`] and the buffer is left empty.

use core::fmt::Write;

use heapless::String;

use crate::constants::PAYLOAD_CAPACITY;
use crate::errors::EncodeError;

use super::record::{StateRecord, FIELD_KEYS};

/// Bounded, NUL-terminated telemetry payload buffer
///
/// Owned by the session and reused every publish; its previous contents are
/// discarded by each encode.
#[derive(Debug, Clone, Default)]
pub struct TelemetryPayload<const N: usize = PAYLOAD_CAPACITY> {
    text: String<N>,
}

impl<const N: usize> TelemetryPayload<N> {
    /// Empty payload
    pub const fn new() -> Self {
        Self { text: String::new() }
    }

    /// Encode `record` with message counter `sequence`, replacing the
    /// buffer contents. Returns the JSON bytes without the terminator.
    pub fn encode(&mut self, record: &StateRecord, sequence: u32) -> Result<&[u8], EncodeError> {
        self.text.clear();
        if write_payload(&mut self.text, record, sequence).is_err() {
            self.text.clear();
            return Err(EncodeError::BufferTooSmall { capacity: N });
        }
        Ok(self.as_bytes())
    }

    /// JSON text without the NUL terminator
    pub fn as_str(&self) -> &str {
        self.text.strip_suffix('\0').unwrap_or(&self.text)
    }

    /// Bytes to publish, without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    /// JSON bytes followed by the NUL terminator
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Length of the JSON text, terminator excluded
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Nothing encoded yet
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Buffer size in bytes, terminator included
    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Encode `record` into `out`
///
/// Free-function form of [`TelemetryPayload::encode`].
pub fn encode<'a, const N: usize>(
    record: &StateRecord,
    sequence: u32,
    out: &'a mut TelemetryPayload<N>,
) -> Result<&'a [u8], EncodeError> {
    out.encode(record, sequence)
}

fn write_payload<W: Write>(out: &mut W, record: &StateRecord, sequence: u32) -> core::fmt::Result {
    write!(out, "{{ \"msgCount\": {}", sequence)?;
    for (key, value) in FIELD_KEYS.iter().zip(record.values()) {
        write!(out, ", \"{}\": {}", key, value)?;
    }
    out.write_str(" }\0")
}
