//! Error Types for the Agent Core
//!
//! ## Design Philosophy
//!
//! The agent runs unattended, so every error here is *local*: it is reported
//! to the caller, logged, and retried at the next opportunity. None of them
//! is fatal and none of them leaves previously valid state half-written.
//!
//! 1. **Small Size**: variants carry at most a field index or a count.
//!
//! 2. **No Heap Allocation**: messages are `&'static str` via `thiserror`;
//!    nothing owns a `String`.
//!
//! 3. **Copy Semantics**: errors are `Copy` so they can be stored in the
//!    session state (the last fault) without clones.
//!
//! ## Error Categories
//!
//! ### Codec
//! - [`DecodeError`]: a serial frame was short, long, or carried a token
//!   that is not an integer for its field
//! - [`EncodeError`]: the telemetry payload would not fit its buffer
//!
//! ### Authentication
//! - [`SignError`]: the device key is unusable, a token buffer is too small,
//!   the token lifetime is zero, or the clock has not been synchronised yet
//!
//! ### Session
//! - [`ConnectError`]: the hub rejected the credential or could not be
//!   reached
//! - [`PublishError`]: the link dropped under a publish
//! - [`TelemetryError`]: either of the two steps of a scheduled publish
//!
//! ### Provisioning
//! - [`ConfigError`]: an identity field is empty or too long for its buffer
//!
//! ## Retry Semantics
//!
//! ```rust
//! use hubagent_core::SignError;
//!
//! fn should_retry(err: SignError) -> bool {
//!     // Bad keys need a new identity; a clock that is still settling does not.
//!     err.is_transient()
//! }
//!
//! assert!(should_retry(SignError::ClockNotSynchronized));
//! assert!(!should_retry(SignError::KeyDecodeFailed));
//! ```

use thiserror_no_std::Error;

/// Failure to turn a serial frame into a [`crate::StateRecord`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame carried fewer tokens than the record has fields
    #[error("Frame has {found} fields, expected 20")]
    TooFewFields {
        /// Number of tokens present in the frame
        found: usize,
    },

    /// Frame carried more tokens than the record has fields
    #[error("Frame has more than 20 fields")]
    TooManyFields,

    /// Token is not a base-10 integer
    #[error("Field {index} is not numeric")]
    NotNumeric {
        /// Zero-based position of the offending token
        index: usize,
    },

    /// Token is an integer but does not fit the field's width
    #[error("Field {index} is out of range for its type")]
    OutOfRange {
        /// Zero-based position of the offending token
        index: usize,
    },
}

/// Failure to build a telemetry payload
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Serialized payload would exceed the destination capacity
    #[error("Payload exceeds buffer capacity of {capacity} bytes")]
    BufferTooSmall {
        /// Capacity of the destination buffer in bytes
        capacity: usize,
    },
}

/// Failure to produce a session credential
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignError {
    /// Device key is not valid base64 or decodes to nothing
    #[error("Device key could not be base64-decoded")]
    KeyDecodeFailed,

    /// Signature, resource or token text did not fit its buffer
    #[error("Signature buffer too small")]
    SignatureBufferTooSmall,

    /// Wall clock is still at its power-on value
    #[error("Clock not synchronized")]
    ClockNotSynchronized,

    /// Requested token lifetime is zero, so the token would expire as issued
    #[error("Token validity must be at least one second")]
    InvalidValidity,
}

impl SignError {
    /// Whether a later attempt can succeed without a new identity
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ClockNotSynchronized)
    }
}

/// Failure to establish a session with the hub
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// Hub refused the credential
    #[error("Credential rejected by hub")]
    CredentialRejected,

    /// Hub unreachable or the link failed during the handshake
    #[error("Transport unavailable")]
    TransportUnavailable,
}

/// Failure to hand a payload to the transport
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// Link dropped before the payload could be queued
    #[error("Not connected")]
    NotConnected,

    /// Transport refused the payload
    #[error("Transport error: {reason}")]
    Transport {
        /// Short description from the transport
        reason: &'static str,
    },
}

/// Failure to get one telemetry payload onto the link
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// Payload did not fit its buffer
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Transport refused the payload
    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Invalid device provisioning data
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Required identity field is empty
    #[error("Field {field} is empty")]
    EmptyField {
        /// Name of the field
        field: &'static str,
    },

    /// Identity field exceeds its bounded buffer
    #[error("Field {field} exceeds {max} bytes")]
    FieldTooLong {
        /// Name of the field
        field: &'static str,
        /// Maximum accepted length in bytes
        max: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::TooFewFields { found } =>
                defmt::write!(fmt, "Frame has {} fields, expected 20", found),
            Self::TooManyFields =>
                defmt::write!(fmt, "Frame has more than 20 fields"),
            Self::NotNumeric { index } =>
                defmt::write!(fmt, "Field {} not numeric", index),
            Self::OutOfRange { index } =>
                defmt::write!(fmt, "Field {} out of range", index),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EncodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::BufferTooSmall { capacity } =>
                defmt::write!(fmt, "Payload exceeds {} bytes", capacity),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SignError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::KeyDecodeFailed => defmt::write!(fmt, "Key decode failed"),
            Self::SignatureBufferTooSmall => defmt::write!(fmt, "Signature buffer too small"),
            Self::ClockNotSynchronized => defmt::write!(fmt, "Clock not synchronized"),
            Self::InvalidValidity => defmt::write!(fmt, "Zero token validity"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::CredentialRejected => defmt::write!(fmt, "Credential rejected"),
            Self::TransportUnavailable => defmt::write!(fmt, "Transport unavailable"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PublishError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotConnected => defmt::write!(fmt, "Not connected"),
            Self::Transport { reason } => defmt::write!(fmt, "Transport: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TelemetryError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Encode(err) => defmt::write!(fmt, "Encode failed: {}", err),
            Self::Publish(err) => defmt::write!(fmt, "Publish failed: {}", err),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::EmptyField { field } => defmt::write!(fmt, "{} is empty", field),
            Self::FieldTooLong { field, max } =>
                defmt::write!(fmt, "{} exceeds {} bytes", field, max),
        }
    }
}
