//! Transport Collaborator Contract
//!
//! The authenticated channel to the hub (TLS socket, MQTT session, topic
//! derivation) lives outside the core. The session manager only needs the
//! handful of primitives below and never looks behind them.
//!
//! ## Contract
//!
//! - `connect` performs the whole handshake and returns once the hub has
//!   accepted or refused the credential. It may block.
//! - `is_connected` is cheap and non-blocking; the manager asks it at the
//!   top of every tick.
//! - `publish` hands a payload to the link. It must not block for longer
//!   than it takes to queue the bytes.
//! - `poll` services the link (keep-alives, inbound messages) and invokes
//!   the registered [`MessageHandler`] for every cloud-to-device message.
//!
//! ## Example Implementation
//!
//! ```rust
//! use hubagent_core::traits::{MessageHandler, Transport};
//! use hubagent_core::{ConnectError, DeviceIdentity, PublishError, SessionCredential};
//!
//! struct Loopback {
//!     up: bool,
//! }
//!
//! impl Transport for Loopback {
//!     fn connect(&mut self, _: &DeviceIdentity, _: &SessionCredential) -> Result<(), ConnectError> {
//!         self.up = true;
//!         Ok(())
//!     }
//!     fn disconnect(&mut self) {
//!         self.up = false;
//!     }
//!     fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
//!         if self.up { Ok(()) } else { Err(PublishError::NotConnected) }
//!     }
//!     fn is_connected(&self) -> bool {
//!         self.up
//!     }
//!     fn telemetry_topic(&self) -> &str {
//!         "devices/loop/messages/events/"
//!     }
//!     fn set_message_handler(&mut self, _handler: MessageHandler) {}
//!     fn poll(&mut self) {}
//! }
//! ```

use crate::auth::SessionCredential;
use crate::config::DeviceIdentity;
use crate::errors::{ConnectError, PublishError};

/// Callback for cloud-to-device messages: `(topic, payload)`
pub type MessageHandler = fn(&str, &[u8]);

/// Authenticated channel to the hub
pub trait Transport {
    /// Open a session presenting `credential` as the password
    fn connect(
        &mut self,
        identity: &DeviceIdentity,
        credential: &SessionCredential,
    ) -> Result<(), ConnectError>;

    /// Close the session, if any. Idempotent.
    fn disconnect(&mut self);

    /// Queue `payload` for delivery on `topic`
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Whether the session is currently up
    fn is_connected(&self) -> bool;

    /// Device-to-cloud telemetry topic for the connected device
    fn telemetry_topic(&self) -> &str;

    /// Register the cloud-to-device message callback
    fn set_message_handler(&mut self, handler: MessageHandler);

    /// Service the link: keep-alives and inbound dispatch
    fn poll(&mut self);
}
