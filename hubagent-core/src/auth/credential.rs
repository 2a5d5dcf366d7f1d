//! Time-bounded session credential

use heapless::String;

use crate::constants::SAS_TOKEN_CAPACITY;

/// Signed SAS token plus its validity window, in seconds since the epoch
///
/// Valid on `[issued_at, expires_at)`. A credential is minted for one
/// connection attempt and dropped with it; it is never presented once
/// `expires_at` has passed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    token: String<SAS_TOKEN_CAPACITY>,
    issued_at: u64,
    expires_at: u64,
}

impl SessionCredential {
    pub(crate) fn new(token: String<SAS_TOKEN_CAPACITY>, issued_at: u64, expires_at: u64) -> Self {
        Self { token, issued_at, expires_at }
    }

    /// `SharedAccessSignature sr=...&sig=...&se=...`
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Signing time, seconds since the epoch
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// The `se` value; the token is invalid from this second on
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// `issued_at <= now < expires_at`
    pub fn is_valid_at(&self, now_secs: u64) -> bool {
        self.issued_at <= now_secs && now_secs < self.expires_at
    }

    /// Whether the session should re-authenticate at `now_secs`
    pub fn needs_refresh(&self, now_secs: u64, margin_secs: u64) -> bool {
        now_secs.saturating_add(margin_secs) >= self.expires_at
    }
}

// The token is a bearer secret for its lifetime.
impl core::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
