//! Integration tests for the session state machine
//!
//! Drives `SessionManager` against a scripted transport and a manual clock
//! that also serves as the backoff delay, so every wait is observable as a
//! clock jump.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use hubagent_core::{
    codec::decode, time::ManualClock, traits::Clock, ConnectError, ConnectionState,
    DeviceIdentity, PublishError, SessionConfig, SignError, StateRecord, TelemetryError,
};

use common::{identity, session, NowSecs, ScriptedTransport, FRAME, START_SECS, TOPIC};

#[test]
fn first_tick_connects_and_publishes() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);

    let record = decode(FRAME).unwrap();
    let report = session.tick(&record);

    assert!(report.connected);
    assert_eq!(report.state, ConnectionState::Connected);
    assert_eq!(report.published, Some(0));
    assert_eq!(session.next_publish_due(), clock.now() + 10_000);

    let transport = session.transport();
    assert_eq!(transport.presented.len(), 1);
    assert_eq!(transport.presented[0].issued_at, START_SECS);
    assert_eq!(transport.presented[0].expires_at, START_SECS + 3600);
    assert!(transport.presented[0].token.starts_with("SharedAccessSignature sr="));

    assert_eq!(transport.published.len(), 1);
    assert_eq!(transport.published[0].0, TOPIC);
    let json = transport.payload_json(0);
    assert_eq!(json["msgCount"], 0);
    assert_eq!(json["sensor_1_temperature"], 250);
    assert_eq!(json["pwm_light"], 5);

    // Serviced once connected
    assert_eq!(transport.polls, 1);
}

#[test]
fn rejected_attempts_back_off_and_resign() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock).with_script(&[
        Err(ConnectError::CredentialRejected),
        Err(ConnectError::TransportUnavailable),
        Err(ConnectError::CredentialRejected),
    ]);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);
    let record = StateRecord::default();

    let report = session.tick(&record);
    assert_eq!(report.state, ConnectionState::Authenticating);
    assert_eq!(report.connect_error, Some(ConnectError::CredentialRejected));
    assert_eq!(report.published, None);
    // Backoff ran through the delay
    assert_eq!(clock.now_secs(), START_SECS + 5);

    let report = session.tick(&record);
    assert_eq!(report.connect_error, Some(ConnectError::TransportUnavailable));
    let report = session.tick(&record);
    assert_eq!(report.state, ConnectionState::Authenticating);

    let report = session.tick(&record);
    assert!(report.connected);
    assert_eq!(report.published, Some(0));

    let presented = &session.transport().presented;
    assert_eq!(presented.len(), 4);
    // Every attempt carries a freshly signed credential
    for pair in presented.windows(2) {
        assert!(pair[1].issued_at > pair[0].issued_at);
        assert_ne!(pair[1].token, pair[0].token);
    }
    assert_eq!(presented[3].issued_at, START_SECS + 15);

    let stats = session.stats();
    assert_eq!(stats.connect_attempts, 4);
    assert_eq!(stats.connect_failures, 3);
    assert_eq!(stats.connects, 1);
}

#[test]
fn credential_is_never_presented_expired() {
    // Short tokens and a long backoff: each rejection outlives the token
    let config = SessionConfig::default()
        .with_token_validity_secs(4)
        .with_reconnect_backoff_ms(10_000);
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock).with_script(&[
        Err(ConnectError::CredentialRejected),
        Err(ConnectError::CredentialRejected),
    ]);
    let mut session = session(&clock, identity(), config, transport);

    for _ in 0..3 {
        session.tick(&StateRecord::default());
    }

    assert_eq!(session.state(), ConnectionState::Connected);
    for presented in &session.transport().presented {
        assert!(presented.presented_at >= presented.issued_at);
        assert!(presented.presented_at < presented.expires_at);
    }
}

#[test]
fn zero_validity_faults_without_presenting() {
    let config = SessionConfig::default().with_token_validity_secs(0);
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), config, transport);

    for _ in 0..3 {
        let report = session.tick(&StateRecord::default());
        assert_eq!(report.state, ConnectionState::Faulted);
        assert!(!report.connected);
    }

    assert_eq!(session.fault(), Some(SignError::InvalidValidity));
    assert!(session.transport().presented.is_empty());
    assert_eq!(session.stats().connect_attempts, 0);
    assert_eq!(session.stats().refreshes, 0);
    assert_eq!(session.run_until_connected(), Err(SignError::InvalidValidity));
}

#[test]
fn one_second_tokens_are_presented_inside_their_window() {
    let config = SessionConfig::default().with_token_validity_secs(1);
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), config, transport);

    for _ in 0..3 {
        session.tick(&StateRecord::default());
        clock.advance(1_000);
    }

    let presented = &session.transport().presented;
    assert_eq!(presented.len(), 3);
    for credential in presented {
        assert!(credential.presented_at >= credential.issued_at);
        assert!(credential.presented_at < credential.expires_at);
    }
}

#[test]
fn lost_link_reconnects_with_new_credential() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);
    let record = StateRecord::default();

    session.tick(&record);
    assert_eq!(session.state(), ConnectionState::Connected);

    clock.advance(2_000);
    session.transport().link_up.set(false);

    let report = session.tick(&record);
    assert!(report.link_lost);
    assert!(report.connected);
    assert_eq!(report.state, ConnectionState::Connected);

    let transport = session.transport();
    assert_eq!(transport.presented.len(), 2);
    assert_eq!(transport.presented[1].issued_at, START_SECS + 2);
    assert!(transport.disconnects >= 1);
    assert_eq!(session.stats().link_losses, 1);
}

#[test]
fn session_refreshes_before_expiry() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);
    let record = StateRecord::default();

    session.tick(&record);
    let first_expiry = session.credential().unwrap().expires_at();
    assert_eq!(first_expiry, START_SECS + 3600);

    // One second before the 300 s margin opens
    clock.set((START_SECS + 3299) * 1000);
    let report = session.tick(&record);
    assert!(!report.refreshed);
    assert_eq!(session.transport().presented.len(), 1);

    clock.set((START_SECS + 3300) * 1000);
    let report = session.tick(&record);
    assert!(report.refreshed);
    assert!(report.connected);
    assert_eq!(report.state, ConnectionState::Connected);

    let credential = session.credential().unwrap();
    assert_eq!(credential.issued_at(), START_SECS + 3300);
    assert_eq!(credential.expires_at(), START_SECS + 3300 + 3600);
    assert_eq!(session.stats().refreshes, 1);
}

#[test]
fn bad_key_faults_until_cleared() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let bad = DeviceIdentity::new(common::HUB, common::DEVICE, "not*base64").unwrap();
    let mut session = session(&clock, bad, SessionConfig::default(), transport);
    let record = StateRecord::default();

    let report = session.tick(&record);
    assert_eq!(report.state, ConnectionState::Faulted);
    assert_eq!(report.sign_error, Some(SignError::KeyDecodeFailed));
    assert_eq!(session.fault(), Some(SignError::KeyDecodeFailed));
    assert!(session.credential().is_none());

    // Stays parked, no further signing, no backoff
    let before = clock.now();
    let report = session.tick(&record);
    assert_eq!(report.state, ConnectionState::Faulted);
    assert_eq!(report.sign_error, None);
    assert_eq!(clock.now(), before);
    assert_eq!(session.stats().sign_failures, 1);
    assert!(session.transport().presented.is_empty());

    session.clear_fault();
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.fault(), None);

    session.tick(&record);
    assert_eq!(session.state(), ConnectionState::Faulted);
    assert_eq!(session.stats().sign_failures, 2);

    assert_eq!(session.run_until_connected(), Err(SignError::KeyDecodeFailed));
}

#[test]
fn unsynchronized_clock_recovers_once_time_is_set() {
    let clock = ManualClock::from_secs(1_000);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);
    let record = StateRecord::default();

    let report = session.tick(&record);
    assert_eq!(report.state, ConnectionState::Faulted);
    assert_eq!(report.sign_error, Some(SignError::ClockNotSynchronized));
    // Waited out the backoff before returning
    assert_eq!(clock.now_secs(), 1_005);

    clock.set(START_SECS * 1000);
    let report = session.tick(&record);
    assert!(report.connected);
    assert_eq!(report.state, ConnectionState::Connected);
    assert_eq!(session.fault(), None);
}

#[test]
fn publishes_follow_the_interval() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);
    let record = decode(FRAME).unwrap();

    assert_eq!(session.tick(&record).published, Some(0));
    let due = session.next_publish_due();

    clock.advance(4_000);
    assert_eq!(session.tick(&record).published, None);
    assert_eq!(session.next_publish_due(), due);

    clock.advance(6_500);
    assert_eq!(session.tick(&record).published, Some(1));
    // Re-armed from when the publish ran, not from the old deadline
    assert_eq!(session.next_publish_due(), clock.now() + 10_000);

    assert_eq!(session.sequence(), 2);
    assert_eq!(session.transport().payload_json(1)["msgCount"], 1);
}

#[test]
fn failed_publish_still_consumes_sequence() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);

    session
        .transport()
        .publish_failure
        .set(Some(PublishError::Transport { reason: "queue full" }));
    let report = session.tick(&StateRecord::default());

    assert_eq!(report.state, ConnectionState::Connected);
    assert_eq!(
        report.telemetry_error,
        Some(TelemetryError::Publish(PublishError::Transport { reason: "queue full" }))
    );
    assert_eq!(session.sequence(), 1);
    assert_eq!(session.stats().publish_failures, 1);
    assert!(session.next_publish_due() > clock.now());
}

#[test]
fn publish_handle_only_while_connected() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);

    assert!(session.connected().is_none());

    session.run_until_connected().unwrap();
    let mut live = session.connected().expect("connected");
    assert_eq!(live.topic(), TOPIC);
    assert!(live.credential().is_some());
    live.publish(b"{}").unwrap();
    assert_eq!(live.publish_record(&StateRecord::default()), Ok(0));

    assert_eq!(session.transport().published.len(), 2);
    assert_eq!(session.transport().published[0].1, b"{}".to_vec());
}

#[test]
fn run_until_connected_rides_out_rejections() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock).with_script(&[
        Err(ConnectError::TransportUnavailable),
        Err(ConnectError::TransportUnavailable),
    ]);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);

    assert_eq!(session.run_until_connected(), Ok(()));
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(clock.now_secs(), START_SECS + 10);
}

#[test]
fn oversized_topic_fails_the_attempt() {
    let clock = ManualClock::from_secs(START_SECS);
    let mut transport = ScriptedTransport::new(&clock);
    transport.topic = "t".repeat(300);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);

    let report = session.tick(&StateRecord::default());
    assert_eq!(report.connect_error, Some(ConnectError::TransportUnavailable));
    assert_eq!(report.state, ConnectionState::Authenticating);
    assert!(!session.transport().link_up.get());
}

static DELIVERED: AtomicUsize = AtomicUsize::new(0);

fn count_message(_topic: &str, payload: &[u8]) {
    DELIVERED.fetch_add(payload.len(), Ordering::SeqCst);
}

#[test]
fn message_handler_reaches_transport() {
    let clock = ManualClock::from_secs(START_SECS);
    let transport = ScriptedTransport::new(&clock);
    let mut session = session(&clock, identity(), SessionConfig::default(), transport);

    session.set_message_handler(count_message);
    assert!(session
        .transport()
        .deliver("devices/sensor-01/messages/devicebound/x", b"ping"));
    assert_eq!(DELIVERED.load(Ordering::SeqCst), 4);
}
