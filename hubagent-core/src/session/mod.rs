//! Session lifecycle
//!
//! [`SessionManager`] drives the connect / authenticate / publish /
//! reconnect state machine on top of the collaborator traits. It is built
//! for a single cooperative execution context: sign, encode and publish
//! never interleave, and the only blocking calls are the transport
//! handshake and the reconnect backoff.
//!
//! ```rust
//! use hubagent_core::session::{ConnectionState, SessionManager};
//! use hubagent_core::time::ManualClock;
//! use hubagent_core::traits::{MessageHandler, Transport};
//! use hubagent_core::{
//!     ConnectError, DeviceIdentity, PublishError, SessionConfig, SessionCredential, StateRecord,
//! };
//!
//! struct Loopback(bool);
//!
//! impl Transport for Loopback {
//!     fn connect(&mut self, _: &DeviceIdentity, _: &SessionCredential) -> Result<(), ConnectError> {
//!         self.0 = true;
//!         Ok(())
//!     }
//!     fn disconnect(&mut self) { self.0 = false; }
//!     fn publish(&mut self, _: &str, _: &[u8]) -> Result<(), PublishError> { Ok(()) }
//!     fn is_connected(&self) -> bool { self.0 }
//!     fn telemetry_topic(&self) -> &str { "devices/dev1/messages/events/" }
//!     fn set_message_handler(&mut self, _: MessageHandler) {}
//!     fn poll(&mut self) {}
//! }
//!
//! let clock = ManualClock::from_secs(1_700_000_000);
//! let identity = DeviceIdentity::new("h.example", "dev1", "aw==")?;
//! let mut session = SessionManager::new(
//!     identity,
//!     SessionConfig::default(),
//!     Loopback(false),
//!     &clock,
//!     &clock,
//! );
//!
//! let report = session.tick(&StateRecord::default());
//! assert_eq!(report.state, ConnectionState::Connected);
//! assert_eq!(report.published, Some(0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod manager;
mod state;

pub use manager::{ConnectedSession, SessionManager};
pub use state::{ConnectionState, SessionStats, TelemetryCounter, TickReport};
