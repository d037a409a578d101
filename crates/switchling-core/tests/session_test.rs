// Session lifecycle against a scripted link: state transitions, the
// single-connection rule, uptime ticking, and in-flight cancellation.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use switchling_core::{ConnectionState, CoreError, SwitchSession};

use common::{FakeLink, config_dialing, test_config};

#[tokio::test]
async fn connect_with_reaches_connected() {
    let session = SwitchSession::new(test_config());
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(session.connected_since().is_none());

    session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect("connect");

    assert_eq!(session.state(), ConnectionState::Connected);
    assert!(session.is_connected());
    assert!(session.connected_since().is_some());
}

#[tokio::test]
async fn second_connect_is_rejected() {
    let session = SwitchSession::new(test_config());
    session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect("connect");

    let err = session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect_err("second connect must fail");
    assert!(matches!(err, CoreError::AlreadyConnected));
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn rejected_connect_does_not_reset_uptime() {
    let session = SwitchSession::new(test_config());
    session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect("connect");

    tokio::time::sleep(Duration::from_millis(3100)).await;
    let before = *session.elapsed().borrow();
    assert!(before >= Duration::from_secs(2), "uptime was {before:?}");

    let _ = session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect_err("second connect must fail");

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let after = *session.elapsed().borrow();
    assert!(after >= before, "uptime went backwards: {before:?} -> {after:?}");
}

#[tokio::test]
async fn disconnect_without_connect_is_a_no_op() {
    let session = SwitchSession::new(test_config());
    session.disconnect().await;
    session.disconnect().await;
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn disconnect_closes_link_and_resets_state() {
    let link = FakeLink::new();
    let recorder = link.recorder();

    let session = SwitchSession::new(test_config());
    session.connect_with(Box::new(link)).await.expect("connect");
    session.disconnect().await;

    assert!(recorder.was_closed());
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(session.connected_since().is_none());
    assert_eq!(*session.elapsed().borrow(), Duration::ZERO);

    // Still fine the second time.
    session.disconnect().await;
    assert_eq!(session.state(), ConnectionState::Disconnected);

    // And the session is reusable: a fresh connect works and commands
    // run (the old teardown's cancellation does not bleed into it).
    session
        .connect_with(Box::new(FakeLink::new().respond("show clock", "12:00:00")))
        .await
        .expect("reconnect");
    let out = session.execute("show clock").await.expect("execute");
    assert_eq!(out, "12:00:00");
}

#[tokio::test]
async fn execute_without_connection_fails() {
    let session = SwitchSession::new(test_config());
    let err = session
        .execute("show clock")
        .await
        .expect_err("no link to run on");
    assert!(matches!(err, CoreError::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn uptime_ticks_once_per_second() {
    let session = SwitchSession::new(test_config());
    session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect("connect");
    assert_eq!(*session.elapsed().borrow(), Duration::ZERO);

    tokio::time::sleep(Duration::from_millis(3100)).await;
    let elapsed = *session.elapsed().borrow();
    assert!(elapsed >= Duration::from_secs(3), "uptime was {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn uptime_stops_after_disconnect() {
    let session = SwitchSession::new(test_config());
    session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect("connect");

    tokio::time::sleep(Duration::from_millis(2100)).await;
    session.disconnect().await;
    assert_eq!(*session.elapsed().borrow(), Duration::ZERO);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(*session.elapsed().borrow(), Duration::ZERO);
}

#[tokio::test]
async fn disconnect_aborts_in_flight_dial() {
    // A listener that accepts TCP but never speaks SSH keeps the dial
    // in flight for the whole connect timeout.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let session = SwitchSession::new(config_dialing(
        "127.0.0.1",
        port,
        Duration::from_secs(30),
    ));
    let dialer = session.clone();
    let task = tokio::spawn(async move { dialer.connect().await });

    // Let the dial get past the TCP connect before pulling the plug.
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.disconnect().await;

    let result = task.await.expect("task join");
    assert!(matches!(result, Err(CoreError::NotConnected)));

    // The late-resolving dial must not overwrite the settled state.
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(session.connected_since().is_none());
    assert_eq!(*session.elapsed().borrow(), Duration::ZERO);
}

#[tokio::test]
async fn connect_times_out_against_a_silent_device() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let session = SwitchSession::new(config_dialing(
        "127.0.0.1",
        port,
        Duration::from_millis(200),
    ));

    let started = std::time::Instant::now();
    let err = session
        .connect()
        .await
        .expect_err("a silent listener cannot complete the handshake");
    assert!(matches!(err, CoreError::ConnectionFailed { .. }), "got {err}");
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "dial did not respect its deadline"
    );
    assert_eq!(session.state(), ConnectionState::Failed);

    // A failed dial leaves the session reusable.
    session
        .connect_with(Box::new(FakeLink::new()))
        .await
        .expect("reconnect after failure");
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_in_flight_command() {
    let session = SwitchSession::new(test_config());
    session
        .connect_with(Box::new(FakeLink::new().hanging_exec()))
        .await
        .expect("connect");

    let runner = session.clone();
    let task = tokio::spawn(async move { runner.execute("show clock").await });

    // Let the spawned command reach the link before pulling the plug.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    session.disconnect().await;

    let result = task.await.expect("task join");
    assert!(matches!(result, Err(CoreError::NotConnected)));
    assert_eq!(session.state(), ConnectionState::Disconnected);
}
