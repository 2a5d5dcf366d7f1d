//! Buffer Sizes and Memory Constraints
//!
//! Every buffer in the agent is fixed-size. These constants size them for
//! an ESP8266-class device (~40KB usable RAM) while leaving room for the
//! longest identifiers the hub accepts.

// ===== TELEMETRY =====

/// Number of fields carried by a serial frame and a [`crate::StateRecord`].
pub const FIELD_COUNT: usize = 20;

/// Telemetry payload capacity in bytes, NUL terminator included.
///
/// Matches the MQTT packet size configured on the deployed device. The
/// largest payload (every field at its widest value, `msgCount` at
/// `u32::MAX`) is well under half of this.
pub const PAYLOAD_CAPACITY: usize = 1024;

/// Serial line capacity in bytes.
///
/// A frame of 20 fields at their widest (`-32768` for temperatures, five
/// digits elsewhere) plus separators is under 140 bytes; the margin absorbs
/// whitespace and `\r`.
pub const FRAME_CAPACITY: usize = 256;

/// Telemetry topic capacity.
///
/// `devices/{device}/messages/events/` plus the content-type and
/// content-encoding properties.
pub const TOPIC_CAPACITY: usize = 256;

// ===== IDENTITY =====

/// Maximum hub host name length.
///
/// DNS limits a fully qualified name to 253 characters; hub names in
/// practice are far shorter.
pub const HUB_MAX_LEN: usize = 128;

/// Maximum device identifier length (hub limit).
pub const DEVICE_ID_MAX_LEN: usize = 128;

/// Maximum base64 device key length.
///
/// Hub keys are 32 or 64 raw bytes; 64 bytes encode to 88 characters.
pub const DEVICE_KEY_MAX_LEN: usize = 128;

// ===== AUTHENTICATION =====

/// Scratch capacity for the decoded device key.
pub const DECODED_KEY_CAPACITY: usize = 96;

/// HMAC-SHA256 digest length.
pub const SIGNATURE_LEN: usize = 32;

/// Base64 text of a 32-byte digest (44 characters).
pub const SIGNATURE_B64_LEN: usize = 44;

/// URL-escaped resource string capacity.
///
/// `{hub}/devices/{device}` with every `/` expanded to `%2F`. Identifiers
/// only escape their separators in practice; fully escaped worst cases are
/// rejected with `SignatureBufferTooSmall` instead of truncated.
pub const RESOURCE_CAPACITY: usize = 320;

/// String-to-sign capacity: escaped resource, newline, expiry digits.
pub const STRING_TO_SIGN_CAPACITY: usize = RESOURCE_CAPACITY + 1 + 20;

/// SAS token capacity.
///
/// Prefix, escaped resource, escaped signature (at most 3x the base64
/// text) and expiry digits.
pub const SAS_TOKEN_CAPACITY: usize = 512;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_fits_longest_resource_and_signature() {
        let fixed = "SharedAccessSignature sr=".len() + "&sig=".len() + "&se=".len();
        assert!(fixed + RESOURCE_CAPACITY + SIGNATURE_B64_LEN * 3 + 20 <= SAS_TOKEN_CAPACITY);
    }

    #[test]
    fn key_capacity_covers_encoded_length() {
        // base64 decodes to at most 3/4 of its text length
        assert!(DEVICE_KEY_MAX_LEN * 3 / 4 <= DECODED_KEY_CAPACITY);
    }
}
