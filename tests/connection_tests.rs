// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connection Manager Integration Tests
//!
//! Runs the manager against the in-memory loopback transport. Timing tests
//! use a paused clock, so backoff and heartbeat periods elapse instantly and
//! deterministically.

mod fixtures;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fixtures::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::Instant;

use survey_sync::action::Action;
use survey_sync::connection::{BackoffPolicy, ConnectionHandle, ConnectionManager, Frame, ManagerConfig};
use survey_sync::store::{AppState, Subscription};
use survey_sync::transport::{memory_transport, MemoryServer};
use survey_sync::{ConnectionState, Store};

type Transitions = Arc<Mutex<Vec<(ConnectionState, u32, Instant)>>>;

fn config() -> ManagerConfig {
    ManagerConfig {
        auth_timeout: Duration::from_secs(5),
        heartbeat_interval: Duration::from_secs(10),
        backoff: BackoffPolicy::new(Duration::from_millis(100), Duration::from_millis(800), 2),
    }
}

struct Harness {
    handle: ConnectionHandle,
    server: MemoryServer,
    store: Store,
    transitions: Transitions,
    _recorder: Subscription,
}

/// Spawn a manager and record every state change it mirrors into the store
fn spawn(config: ManagerConfig) -> Harness {
    let store = Store::new(AppState::default());
    let transitions: Transitions = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&transitions);
    let recorder = store.on_action(move |action, _| {
        if let Action::ConnectionChanged { state, attempts, .. } = action {
            log.lock().unwrap().push((*state, *attempts, Instant::now()));
        }
    });

    let (transport, server) = memory_transport();
    let handle = ConnectionManager::spawn(
        Arc::new(transport),
        MockApi::with_token(),
        store.clone(),
        config,
    );
    Harness {
        handle,
        server,
        store,
        transitions,
        _recorder: recorder,
    }
}

/// Milliseconds between each reconnect and the attempt it scheduled
fn backoff_delays(transitions: &Transitions) -> Vec<u128> {
    transitions
        .lock()
        .unwrap()
        .windows(2)
        .filter_map(|pair| match (pair[0], pair[1]) {
            ((ConnectionState::Reconnecting, _, lost), (ConnectionState::Authenticating, _, retry)) => {
                // Round to the nearest 10ms
                Some(((retry - lost).as_millis() + 5) / 10 * 10)
            }
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_backoff_grows_and_is_capped() {
    let Harness { handle, mut server, store, transitions, _recorder } = spawn(config());
    server.set_refusing(true);

    handle.connect().unwrap();
    handle
        .status()
        .wait_for(|lifecycle| lifecycle.attempts >= 6)
        .await
        .unwrap();
    store.flush().await.unwrap();

    let delays = backoff_delays(&transitions);
    assert_eq!(delays[..5].to_vec(), vec![100, 200, 400, 800, 800]);
    assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(delays.iter().all(|&delay| delay <= 800));

    // A successful connect resets the attempt counter
    server.set_refusing(false);
    let _conn = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();
    store.flush().await.unwrap();

    assert_eq!(handle.attempts(), 0);
    assert_eq!(store.state().connection.attempts, 0);
    assert_eq!(store.state().connection.state, ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_missed_heartbeat_reconnects() {
    let Harness { handle, mut server, store, transitions, _recorder } = spawn(config());

    handle.connect().unwrap();
    let mut first = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();

    // Ping goes unanswered; the next tick gives up on the channel
    assert_eq!(first.recv().await, Some(Frame::ping()));
    assert_eq!(first.recv().await, None);

    let _second = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();
    store.flush().await.unwrap();

    let states: Vec<(ConnectionState, u32)> = transitions
        .lock()
        .unwrap()
        .iter()
        .map(|&(state, attempts, _)| (state, attempts))
        .collect();
    assert_eq!(
        states,
        vec![
            (ConnectionState::Authenticating, 0),
            (ConnectionState::Connected, 0),
            (ConnectionState::Reconnecting, 1),
            (ConnectionState::Authenticating, 1),
            (ConnectionState::Connected, 0),
        ]
    );
    assert_eq!(server.opens(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_answered_heartbeat_keeps_channel() {
    let Harness { handle, mut server, .. } = spawn(config());

    handle.connect().unwrap();
    let mut conn = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();

    for _ in 0..3 {
        assert_eq!(conn.recv().await, Some(Frame::ping()));
        conn.send(Frame::pong()).unwrap();
    }

    assert_eq!(handle.state(), ConnectionState::Connected);
    assert_eq!(server.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_reconnect() {
    let Harness { handle, server, store, .. } = spawn(config());
    server.set_refusing(true);

    handle.connect().unwrap();
    handle
        .status()
        .wait_for(|lifecycle| lifecycle.attempts >= 2)
        .await
        .unwrap();

    handle.close().unwrap();
    handle.wait_for(ConnectionState::Disconnected).await.unwrap();
    let opens = server.opens();

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(server.opens(), opens);
    assert_eq!(handle.state(), ConnectionState::Disconnected);
    assert_eq!(handle.attempts(), 0);
    store.flush().await.unwrap();
    assert_eq!(store.state().connection.state, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_auth_times_out() {
    let Harness { handle, mut server, .. } = spawn(config());

    handle.connect().unwrap();
    let mut silent = server.accept().await.unwrap();
    assert_eq!(silent.recv().await, Some(Frame::auth(PUSH_TOKEN)));

    // The manager gives up after the auth timeout and opens a new channel
    let _conn = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();
    assert!(silent.is_closed());
}

#[tokio::test]
async fn test_server_drop_reconnects_and_resumes_routing() {
    let Harness { handle, mut server, store, .. } = spawn(ManagerConfig {
        backoff: BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(20), 2),
        heartbeat_interval: Duration::from_secs(3600),
        ..config()
    });

    handle.connect().unwrap();
    let first = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();
    drop(first);

    let second = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();

    second
        .send(Frame::new(
            "baselayer/SHOW_NOTIFICATION",
            json!({ "note": "back online", "type": "info" }),
        ))
        .unwrap();
    let mut changes = store.changes();
    changes
        .wait_for(|snapshot| !snapshot.state.notifications.items.is_empty())
        .await
        .unwrap();

    assert_eq!(store.state().notifications.items[0].note, "back online");
    assert_eq!(handle.attempts(), 0);
}

#[tokio::test]
async fn test_unknown_and_malformed_frames_are_dropped() {
    let Harness { handle, mut server, store, .. } = spawn(config());

    handle.connect().unwrap();
    let conn = accept_authenticated(&mut server).await;
    handle.wait_for(ConnectionState::Connected).await.unwrap();

    conn.send(Frame::new("skyportal/SOMETHING_NEW", json!({}))).unwrap();
    conn.send(Frame::new("skyportal/REFRESH_GROUP", json!({ "group": "x" })))
        .unwrap();
    conn.send(Frame::new(
        "baselayer/SHOW_NOTIFICATION",
        json!({ "note": "still here", "type": "warning" }),
    ))
    .unwrap();

    let mut changes = store.changes();
    changes
        .wait_for(|snapshot| !snapshot.state.notifications.items.is_empty())
        .await
        .unwrap();

    assert_eq!(handle.state(), ConnectionState::Connected);
    assert_eq!(store.state().notifications.items.len(), 1);
}
