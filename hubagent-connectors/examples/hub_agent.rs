//! Telemetry agent for a Linux gateway
//!
//! Reads CSV frames from a serial device (or stdin), keeps the latest as the
//! device state, and publishes it to the hub on the configured interval.
//!
//! ```text
//! RUST_LOG=info cargo run --example hub_agent -- agent.json
//! ```

use std::fs::File;
use std::io;
use std::time::Duration;

use hubagent_connectors::{AgentSettings, ConnectorError, MqttTransport, SerialFeed};
use hubagent_core::time::{SystemClock, ThreadDelay};
use hubagent_core::{SessionManager, SignError, StateRecord};

/// Loop period; publishes still follow the session's telemetry interval
const TICK: Duration = Duration::from_millis(100);

/// Remembers the last signing fault so a parked session is reported once
#[derive(Debug, Default)]
struct FaultWatch {
    last: Option<SignError>,
}

impl FaultWatch {
    /// Returns a persistent fault the first time it is seen
    fn observe(&mut self, fault: Option<SignError>) -> Option<SignError> {
        let fault = fault.filter(|err| !err.is_transient());
        let fresh = fault.filter(|_| fault != self.last);
        self.last = fault;
        fresh
    }
}

fn print_c2d(topic: &str, payload: &[u8]) {
    log::info!("Message arrived on {}: {}", topic, String::from_utf8_lossy(payload));
}

fn main() -> Result<(), ConnectorError> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "agent.json".to_string());
    let settings = AgentSettings::load(&path)?;
    log::info!("Loaded {:?}", settings);

    let mut feed = match &settings.serial.path {
        Some(device) => SerialFeed::spawn(File::open(device)?)?,
        None => SerialFeed::spawn(io::stdin())?,
    };

    let transport = MqttTransport::new(settings.mqtt.clone());
    let mut session = SessionManager::new(
        settings.identity()?,
        settings.session,
        transport,
        SystemClock,
        ThreadDelay,
    );
    session.set_message_handler(print_c2d);

    let mut faults = FaultWatch::default();
    if let Err(err) = session.run_until_connected() {
        log::error!("Cannot sign credentials: {}. Telemetry is held until the key is fixed", err);
        faults.observe(Some(err));
    }

    let mut record = StateRecord::default();
    loop {
        feed.drain(&mut record);

        let report = session.tick(&record);
        if let Some(sequence) = report.published {
            log::debug!("Published telemetry #{}", sequence);
        }
        if let Some(err) = faults.observe(session.fault()) {
            log::error!("Signing faulted: {}. Telemetry is held until the key is fixed", err);
        }

        std::thread::sleep(TICK);
    }
}
