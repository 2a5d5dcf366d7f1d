//! Frame and payload codec
//!
//! Two allocation-free translations around [`StateRecord`]:
//!
//! ```text
//! serial line ──decode──▶ StateRecord ──encode──▶ JSON payload (≤ 1024 B)
//! ```
//!
//! Both are bounded-time and pure apart from writing the caller's buffer.
//!
//! ```rust
//! use hubagent_core::codec::{decode, TelemetryPayload};
//!
//! let record = decode("1,250,45,10,400,1,250,45,10,400,1,50,1200,1,50,1200,1,0,0,5")?;
//! let mut payload: TelemetryPayload = TelemetryPayload::new();
//! let json = payload.encode(&record, 0)?;
//! assert!(json.starts_with(b"{ \"msgCount\": 0"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decode;
mod encode;
mod record;

pub use decode::decode;
pub use encode::{encode, TelemetryPayload};
pub use record::{FanGroup, Outputs, SensorGroup, StateRecord, FIELD_KEYS};
