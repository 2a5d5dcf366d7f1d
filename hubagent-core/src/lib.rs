//! Core session engine for HubAgent
//!
//! Keeps a constrained device reporting to a cloud telemetry hub:
//! signs time-limited SAS credentials, runs the connect / publish /
//! reconnect state machine, and translates serial frames into bounded JSON
//! telemetry.
//!
//! Key constraints:
//! - Runs on ESP8266-class devices (~40KB RAM)
//! - No heap allocation anywhere; every buffer is fixed-size
//! - Single cooperative execution context, no locks
//!
//! ```no_run
//! use hubagent_core::{SessionManager, SessionConfig, DeviceIdentity, StateRecord};
//! use hubagent_core::time::{SystemClock, ThreadDelay};
//! use hubagent_core::traits::Transport;
//!
//! fn run<T: Transport>(transport: T) -> Result<(), hubagent_core::ConfigError> {
//!     let identity = DeviceIdentity::new("myhub.azure-devices.net", "sensor-01", "c2VjcmV0")?;
//!     let mut session = SessionManager::new(
//!         identity,
//!         SessionConfig::default(),
//!         transport,
//!         SystemClock,
//!         ThreadDelay,
//!     );
//!
//!     let mut record = StateRecord::default();
//!     loop {
//!         // Feed each serial line as it arrives; bad frames leave `record` as it was
//!         let _ = record.update_from_frame("1,250,45,10,400,1,250,45,10,400,1,50,1200,1,50,1200,1,0,0,5");
//!         session.tick(&record);
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod auth;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod session;
pub mod time;
pub mod traits;

// Public API
pub use auth::{SessionCredential, TokenSigner};
pub use codec::{decode, encode, StateRecord, TelemetryPayload};
pub use config::{DeviceIdentity, SessionConfig};
pub use errors::{
    ConfigError, ConnectError, DecodeError, EncodeError, PublishError, SignError, TelemetryError,
};
pub use frame::FrameAssembler;
pub use session::{ConnectionState, SessionManager, TickReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
