//! Device authentication
//!
//! Mints the time-scoped Shared Access Signature the hub expects as the
//! connection password. See [`signer`] for the exact algorithm.
//!
//! ```rust
//! use hubagent_core::auth::TokenSigner;
//! use hubagent_core::DeviceIdentity;
//!
//! let identity = DeviceIdentity::new("h.example", "dev1", "aw==")?;
//! let credential = TokenSigner::new().sign(&identity, 1000, 3600)?;
//! assert_eq!(credential.expires_at(), 4600);
//! assert!(credential.token().starts_with("SharedAccessSignature sr=h.example%2Fdevices%2Fdev1&sig="));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod credential;
mod escape;
pub mod signer;

pub use credential::SessionCredential;
pub use signer::{sign, TokenSigner};
