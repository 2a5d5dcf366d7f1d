//! Constants for HubAgent Core
//!
//! Centralised sizes and intervals used across the codec, signer and
//! session manager.
//!
//! ## Organization
//!
//! - **Buffers**: capacities of every fixed-size buffer
//! - **Time**: scheduler intervals, token lifetime, clock sanity floor

/// Buffer sizes and memory constraints.
pub mod buffers;

/// Time-related constants for intervals and token lifetimes.
pub mod time;

pub use buffers::{
    FIELD_COUNT, PAYLOAD_CAPACITY, FRAME_CAPACITY, SAS_TOKEN_CAPACITY, TOPIC_CAPACITY,
    HUB_MAX_LEN, DEVICE_ID_MAX_LEN, DEVICE_KEY_MAX_LEN,
};

pub use time::{
    MS_PER_SECOND, DEFAULT_TELEMETRY_INTERVAL_MS, DEFAULT_TOKEN_VALIDITY_SECS,
    DEFAULT_RECONNECT_BACKOFF_MS, DEFAULT_REFRESH_MARGIN_SECS, CLOCK_SANITY_FLOOR_SECS,
};
