//! Collaborator Traits
//!
//! The core talks to the outside world through three narrow seams:
//!
//! - [`time`] - wall clock and blocking delay
//! - [`transport`] - the authenticated channel to the hub
//!
//! Everything behind these traits (WiFi association, TLS trust anchors,
//! SNTP, the MQTT client) belongs to the platform and is swapped per target.

pub mod time;
pub mod transport;

pub use time::{Clock, Delay};
pub use transport::{MessageHandler, Transport};
