//! SAS token signing
//!
//! ## Algorithm
//!
//! ```text
//! resource       = url_escape(hub + "/devices/" + device_id)
//! expires_at     = now + validity                       (seconds)
//! string_to_sign = resource + "\n" + expires_at
//! signature      = base64(HMAC-SHA256(base64_decode(key), string_to_sign))
//! token          = "SharedAccessSignature sr=" + resource
//!                  + "&sig=" + url_escape(signature)
//!                  + "&se=" + expires_at
//! ```
//!
//! Field names and order in the token are fixed by the hub.
//!
//! All intermediate text lives in stack buffers sized in
//! [`crate::constants::buffers`]. The decoded key is wiped before
//! returning.

use core::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use heapless::String;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::DeviceIdentity;
use crate::constants::buffers::{
    DECODED_KEY_CAPACITY, RESOURCE_CAPACITY, SIGNATURE_B64_LEN, STRING_TO_SIGN_CAPACITY,
};
use crate::constants::{CLOCK_SANITY_FLOOR_SECS, SAS_TOKEN_CAPACITY};
use crate::errors::SignError;
use crate::time::to_secs;
use crate::traits::Clock;

use super::credential::SessionCredential;
use super::escape::escape_into;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "SharedAccessSignature ";

/// Produces SAS credentials for a device identity
///
/// Signing is a pure function of `(identity, now, validity)`.
#[derive(Debug, Clone, Copy)]
pub struct TokenSigner {
    clock_floor_secs: u64,
}

impl Default for TokenSigner {
    fn default() -> Self {
        Self { clock_floor_secs: CLOCK_SANITY_FLOOR_SECS }
    }
}

impl TokenSigner {
    /// Signer with the default clock sanity floor
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the earliest clock reading accepted by [`Self::sign_now`]
    pub fn with_clock_floor_secs(mut self, secs: u64) -> Self {
        self.clock_floor_secs = secs;
        self
    }

    /// Sign a credential valid from `now_secs` for `validity_secs`
    pub fn sign(
        &self,
        identity: &DeviceIdentity,
        now_secs: u64,
        validity_secs: u64,
    ) -> Result<SessionCredential, SignError> {
        sign(identity, now_secs, validity_secs)
    }

    /// Sign against the current reading of `clock`
    ///
    /// Fails with [`SignError::ClockNotSynchronized`] while the clock is
    /// below the sanity floor, since an expiry derived from it would already
    /// be in the past for the hub.
    pub fn sign_now<C: Clock>(
        &self,
        identity: &DeviceIdentity,
        clock: &C,
        validity_secs: u64,
    ) -> Result<SessionCredential, SignError> {
        let now_secs = to_secs(clock.now());
        if now_secs < self.clock_floor_secs {
            return Err(SignError::ClockNotSynchronized);
        }
        sign(identity, now_secs, validity_secs)
    }
}

/// Sign a credential valid on `[now_secs, now_secs + validity_secs)`
///
/// A zero `validity_secs` is refused with [`SignError::InvalidValidity`]:
/// the window would be empty and the token expired on issue.
pub fn sign(
    identity: &DeviceIdentity,
    now_secs: u64,
    validity_secs: u64,
) -> Result<SessionCredential, SignError> {
    if validity_secs == 0 {
        return Err(SignError::InvalidValidity);
    }
    let expires_at = now_secs.saturating_add(validity_secs);

    let resource = escaped_resource(identity)?;
    let string_to_sign = string_to_sign(&resource, expires_at)?;

    let mut signature = [0u8; SIGNATURE_B64_LEN];
    let signature_len = hmac_signature(identity.key(), string_to_sign.as_bytes(), &mut signature)?;

    let mut token: String<SAS_TOKEN_CAPACITY> = String::new();
    write!(token, "{}sr={}&sig=", TOKEN_PREFIX, resource)
        .map_err(|_| SignError::SignatureBufferTooSmall)?;
    escape_into(&signature[..signature_len], &mut token)?;
    write!(token, "&se={}", expires_at)
        .map_err(|_| SignError::SignatureBufferTooSmall)?;

    Ok(SessionCredential::new(token, now_secs, expires_at))
}

/// `url_escape(hub + "/devices/" + device_id)`
pub fn escaped_resource(identity: &DeviceIdentity) -> Result<String<RESOURCE_CAPACITY>, SignError> {
    let mut raw: String<RESOURCE_CAPACITY> = String::new();
    write!(raw, "{}/devices/{}", identity.hub(), identity.device_id())
        .map_err(|_| SignError::SignatureBufferTooSmall)?;

    let mut escaped = String::new();
    escape_into(raw.as_bytes(), &mut escaped)?;
    Ok(escaped)
}

fn string_to_sign(resource: &str, expires_at: u64) -> Result<String<STRING_TO_SIGN_CAPACITY>, SignError> {
    let mut out = String::new();
    write!(out, "{}\n{}", resource, expires_at)
        .map_err(|_| SignError::SignatureBufferTooSmall)?;
    Ok(out)
}

/// Base64 HMAC-SHA256 of `message` under the base64-encoded `key`
///
/// Writes the base64 text into `out` and returns its length.
fn hmac_signature(
    key: &str,
    message: &[u8],
    out: &mut [u8; SIGNATURE_B64_LEN],
) -> Result<usize, SignError> {
    let mut decoded = [0u8; DECODED_KEY_CAPACITY];
    let decoded_len = STANDARD
        .decode_slice(key.as_bytes(), &mut decoded)
        .map_err(|_| SignError::KeyDecodeFailed);

    let result = match decoded_len {
        Ok(0) => Err(SignError::KeyDecodeFailed),
        Ok(len) => {
            let mac = HmacSha256::new_from_slice(&decoded[..len]);
            match mac {
                Ok(mut mac) => {
                    mac.update(message);
                    let digest = mac.finalize().into_bytes();
                    STANDARD
                        .encode_slice(digest, &mut out[..])
                        .map_err(|_| SignError::SignatureBufferTooSmall)
                }
                Err(_) => Err(SignError::KeyDecodeFailed),
            }
        }
        Err(err) => Err(err),
    };

    decoded.fill(0);
    result
}
