//! Connection lifecycle and publish cadence
//!
//! ## One Tick
//!
//! The outer loop calls [`SessionManager::tick`] with the latest record.
//! Each tick runs these steps in order, each one to completion:
//!
//! 1. **Health**: a `Connected` session whose transport reports down goes
//!    back to `Disconnected`.
//! 2. **Refresh**: a `Connected` session whose credential is inside the
//!    refresh margin is closed, so no credential is ever presented, or
//!    relied on, past its expiry.
//! 3. **Connect**: `Disconnected` signs a fresh credential and makes one
//!    connection attempt. A rejected attempt blocks for the fixed backoff
//!    and leaves the manager in `Authenticating`; the next tick signs again.
//! 4. **Publish**: when `now >= next_publish_due`, the record is encoded
//!    and published, and the deadline becomes `now + interval`.
//! 5. **Service**: the transport is polled for keep-alives and
//!    cloud-to-device messages.
//!
//! ## Cadence
//!
//! The deadline is re-armed from the time the publish step *ran*, not from
//! the previous deadline. Work done in the tick (and any backoff) therefore
//! pushes every later publish back; over hours the period drifts by the sum
//! of that work. Telemetry tolerates this; nothing here is a precise timer.
//!
//! ## Retry Policy
//!
//! Connection attempts are retried forever with a fixed backoff; there is no
//! operator to escalate to. Signing failures are different: a bad key
//! parks the manager in `Faulted` until [`SessionManager::clear_fault`],
//! while an unsynchronised clock is retried on the next tick.

use heapless::String;

use crate::auth::{SessionCredential, TokenSigner};
use crate::codec::{StateRecord, TelemetryPayload};
use crate::config::{DeviceIdentity, SessionConfig};
use crate::constants::TOPIC_CAPACITY;
use crate::errors::{ConnectError, PublishError, SignError, TelemetryError};
use crate::time::{to_secs, Timestamp};
use crate::traits::{Clock, Delay, MessageHandler, Transport};

use super::state::{ConnectionState, SessionStats, TelemetryCounter, TickReport};

/// Owns the session state machine and every buffer it uses
///
/// The payload buffer, the topic and the current credential live here and
/// nowhere else; each tick treats them as scratch.
pub struct SessionManager<T: Transport, C: Clock, D: Delay> {
    identity: DeviceIdentity,
    config: SessionConfig,
    signer: TokenSigner,
    transport: T,
    clock: C,
    delay: D,

    state: ConnectionState,
    fault: Option<SignError>,
    credential: Option<SessionCredential>,

    next_publish_due: Timestamp,
    counter: TelemetryCounter,
    payload: TelemetryPayload,
    topic: String<TOPIC_CAPACITY>,

    stats: SessionStats,
}

impl<T: Transport, C: Clock, D: Delay> SessionManager<T, C, D> {
    /// Build a manager in `Disconnected`; nothing is signed or opened until
    /// the first tick
    pub fn new(identity: DeviceIdentity, config: SessionConfig, transport: T, clock: C, delay: D) -> Self {
        Self {
            identity,
            config,
            signer: TokenSigner::new(),
            transport,
            clock,
            delay,
            state: ConnectionState::Disconnected,
            fault: None,
            credential: None,
            next_publish_due: 0,
            counter: TelemetryCounter::new(),
            payload: TelemetryPayload::new(),
            topic: String::new(),
            stats: SessionStats::default(),
        }
    }

    /// Replace the default signer (e.g. to move the clock sanity floor)
    pub fn with_signer(mut self, signer: TokenSigner) -> Self {
        self.signer = signer;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Signing error that put the manager in `Faulted`
    pub fn fault(&self) -> Option<SignError> {
        self.fault
    }

    /// Credential of the current attempt or session
    pub fn credential(&self) -> Option<&SessionCredential> {
        self.credential.as_ref()
    }

    /// Lifetime counters
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Identity every credential is signed for
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Timings in force
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sequence number the next payload will carry
    pub fn sequence(&self) -> u32 {
        self.counter.current()
    }

    /// Earliest time the next telemetry publish may run (ms)
    pub fn next_publish_due(&self) -> Timestamp {
        self.next_publish_due
    }

    /// Read-only view of the transport; publishing goes through
    /// [`Self::connected`]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Route cloud-to-device messages to `handler`
    pub fn set_message_handler(&mut self, handler: MessageHandler) {
        self.transport.set_message_handler(handler);
    }

    /// Publish handle, available only while `Connected`
    pub fn connected(&mut self) -> Option<ConnectedSession<'_, T, C, D>> {
        match self.state {
            ConnectionState::Connected => Some(ConnectedSession { manager: self }),
            _ => None,
        }
    }

    /// Sign a fresh credential and enter `Authenticating`
    ///
    /// Any previous credential is dropped first. On failure the manager
    /// enters `Faulted` and keeps the error; a transient (clock) failure also
    /// waits out the backoff so a spinning outer loop does not hammer it.
    /// A live session is left alone.
    fn connect(&mut self) -> Result<(), SignError> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        self.credential = None;

        match self.signer.sign_now(&self.identity, &self.clock, self.config.token_validity_secs) {
            Ok(credential) => {
                log_debug!(
                    "Signed credential issued at {} expiring at {}",
                    credential.issued_at(),
                    credential.expires_at()
                );
                self.credential = Some(credential);
                self.fault = None;
                self.state = ConnectionState::Authenticating;
                Ok(())
            }
            Err(err) => {
                log_error!("Failed generating SAS token: {}", err);
                self.stats.sign_failures = self.stats.sign_failures.wrapping_add(1);
                self.fault = Some(err);
                self.state = ConnectionState::Faulted;
                if err.is_transient() {
                    self.delay.delay_ms(self.config.reconnect_backoff_ms);
                }
                Err(err)
            }
        }
    }

    /// Leave `Faulted` so the next tick signs again
    ///
    /// For operator-driven recovery after a persistent signing fault.
    pub fn clear_fault(&mut self) {
        if self.state == ConnectionState::Faulted {
            self.fault = None;
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Block until a session is up
    ///
    /// Ticks the connect path with no record to publish. Returns the signing
    /// error if the manager faults on a persistent one; transport rejections
    /// are retried without bound.
    pub fn run_until_connected(&mut self) -> Result<(), SignError> {
        loop {
            self.step_connection(&mut TickReport::default());
            match self.state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Faulted => match self.fault {
                    Some(err) if !err.is_transient() => return Err(err),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    /// Run one scheduler tick against the latest `record`
    pub fn tick(&mut self, record: &StateRecord) -> TickReport {
        let mut report = TickReport::default();

        self.step_connection(&mut report);

        let now = self.clock.now();
        if let Some(mut session) = self.connected() {
            if now >= session.manager.next_publish_due {
                match session.publish_record(record) {
                    Ok(sequence) => report.published = Some(sequence),
                    Err(err) => report.telemetry_error = Some(err),
                }
                session.manager.next_publish_due = now.saturating_add(session.manager.config.telemetry_interval_ms);
            }
        }

        if self.state == ConnectionState::Connected {
            self.transport.poll();
        }

        report.state = self.state;
        report
    }

    /// Health check, proactive refresh and at most one connection attempt
    fn step_connection(&mut self, report: &mut TickReport) {
        if self.state == ConnectionState::Connected && !self.transport.is_connected() {
            log_warn!("Connection to hub lost, reconnecting");
            self.stats.link_losses = self.stats.link_losses.wrapping_add(1);
            report.link_lost = true;
            self.end_session();
        }

        if self.state == ConnectionState::Connected && self.credential_due_for_refresh() {
            log_info!("SAS token near expiry, renewing session");
            self.stats.refreshes = self.stats.refreshes.wrapping_add(1);
            report.refreshed = true;
            self.end_session();
        }

        if self.state == ConnectionState::Faulted {
            match self.fault {
                Some(err) if err.is_transient() => self.state = ConnectionState::Disconnected,
                _ => return,
            }
        }

        if self.state == ConnectionState::Disconnected {
            if let Err(err) = self.connect() {
                report.sign_error = Some(err);
                return;
            }
        }

        if self.state == ConnectionState::Authenticating {
            self.attempt(report);
        }
    }

    /// Present the current credential once
    fn attempt(&mut self, report: &mut TickReport) {
        // Never present a stale credential: a previous tick's one may have
        // aged past expiry while we were backing off.
        let now_secs = to_secs(self.clock.now());
        let fresh = self.credential.as_ref().map_or(false, |c| c.is_valid_at(now_secs));
        if !fresh {
            if let Err(err) = self.connect() {
                report.sign_error = Some(err);
                return;
            }
        }

        let Some(credential) = self.credential.as_ref() else {
            return;
        };
        if !credential.is_valid_at(now_secs) {
            log_error!(
                "Refusing to present credential expiring at {} (now {})",
                credential.expires_at(),
                now_secs
            );
            self.credential = None;
            return;
        }

        log_info!("Connecting to hub {} as {}", self.identity.hub(), self.identity.device_id());
        self.stats.connect_attempts = self.stats.connect_attempts.wrapping_add(1);

        let mut result = self.transport.connect(&self.identity, credential);
        if result.is_ok() {
            result = self.capture_topic();
        }

        match result {
            Ok(()) => {
                log_info!("Connected to hub");
                self.stats.connects = self.stats.connects.wrapping_add(1);
                self.state = ConnectionState::Connected;
                report.connected = true;
            }
            Err(err) => {
                log_warn!(
                    "Hub connection failed: {}. Trying again in {} ms",
                    err,
                    self.config.reconnect_backoff_ms
                );
                self.stats.connect_failures = self.stats.connect_failures.wrapping_add(1);
                report.connect_error = Some(err);
                self.transport.disconnect();
                // The next attempt signs a new credential.
                self.credential = None;
                self.delay.delay_ms(self.config.reconnect_backoff_ms);
            }
        }
    }

    fn capture_topic(&mut self) -> Result<(), ConnectError> {
        self.topic.clear();
        self.topic
            .push_str(self.transport.telemetry_topic())
            .map_err(|_| {
                log_error!("Telemetry topic exceeds {} bytes", TOPIC_CAPACITY);
                ConnectError::TransportUnavailable
            })
    }

    fn credential_due_for_refresh(&self) -> bool {
        let now_secs = to_secs(self.clock.now());
        let margin = self.config.effective_refresh_margin_secs();
        self.credential
            .as_ref()
            .map_or(true, |c| c.needs_refresh(now_secs, margin))
    }

    fn end_session(&mut self) {
        self.transport.disconnect();
        self.credential = None;
        self.topic.clear();
        self.state = ConnectionState::Disconnected;
    }
}

/// Publish access to a live session
///
/// Only [`SessionManager::connected`] creates one, and only in
/// `Connected`, so there is no way to publish from any other state.
pub struct ConnectedSession<'a, T: Transport, C: Clock, D: Delay> {
    manager: &'a mut SessionManager<T, C, D>,
}

impl<T: Transport, C: Clock, D: Delay> ConnectedSession<'_, T, C, D> {
    /// Credential the live session was opened with
    pub fn credential(&self) -> Option<&SessionCredential> {
        self.manager.credential.as_ref()
    }

    /// Telemetry topic captured at connect time
    pub fn topic(&self) -> &str {
        &self.manager.topic
    }

    /// Publish raw bytes on the telemetry topic
    pub fn publish(&mut self, payload: &[u8]) -> Result<(), PublishError> {
        let manager = &mut *self.manager;
        let result = manager.transport.publish(&manager.topic, payload);
        manager.record_publish(&result);
        result
    }

    /// Encode `record` and publish it; returns the sequence number used
    ///
    /// The counter advances once the payload is built, whether or not the
    /// transport then accepts it.
    pub fn publish_record(&mut self, record: &StateRecord) -> Result<u32, TelemetryError> {
        let manager = &mut *self.manager;
        let sequence = manager.counter.current();

        let bytes = match manager.payload.encode(record, sequence) {
            Ok(bytes) => bytes,
            Err(err) => {
                log_error!("Failed building telemetry payload: {}", err);
                return Err(err.into());
            }
        };
        manager.counter.advance();

        log_debug!("Sending telemetry #{} ({} bytes)", sequence, bytes.len());
        let result = manager.transport.publish(&manager.topic, bytes);
        manager.record_publish(&result);
        result?;
        Ok(sequence)
    }
}

impl<T: Transport, C: Clock, D: Delay> SessionManager<T, C, D> {
    fn record_publish(&mut self, result: &Result<(), PublishError>) {
        match result {
            Ok(()) => self.stats.publishes = self.stats.publishes.wrapping_add(1),
            Err(err) => {
                log_warn!("Telemetry publish failed: {}", err);
                self.stats.publish_failures = self.stats.publish_failures.wrapping_add(1);
            }
        }
    }
}
