// Copyright (c) 2025 - Cowboy AI, Inc.
//! Push-channel connection manager
//!
//! A single task owns the channel, drives the [`ConnectionLifecycle`] FSM and
//! is the only writer of connection state. Every frame received while
//! `Connected` is routed and dispatched in arrival order.
//!
//! ```text
//!            connect()
//! Disconnected ──────> Authenticating ──auth_ok──> Connected
//!      ^                 │    ^                       │
//!      │ auth_rejected   │    │ backoff elapsed       │ channel drop /
//!      └─────────────────┘    │                       │ missed pong
//!                             └──── Reconnecting <────┘
//! ```
//!
//! `close()` is the only way to stop retrying.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::frame::{self, Frame};
use super::routing::{route, Routed};
use crate::action::Action;
use crate::api::{self, ApiClient};
use crate::config::PushConfig;
use crate::errors::{SyncError, SyncResult};
use crate::state_machine::{
    ConnectionEffect, ConnectionInput, ConnectionLifecycle, ConnectionState, StateMachine,
};
use crate::store::Store;
use crate::transport::{PushChannel, PushTransport};

/// Timing parameters of the manager
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerConfig {
    /// How long the server has to accept the auth token
    pub auth_timeout: Duration,
    /// Ping period while connected
    pub heartbeat_interval: Duration,
    /// Reconnect delays
    pub backoff: BackoffPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        (&PushConfig::default()).into()
    }
}

impl From<&PushConfig> for ManagerConfig {
    fn from(config: &PushConfig) -> Self {
        Self {
            auth_timeout: config.auth_timeout,
            heartbeat_interval: config.heartbeat_interval,
            backoff: config.backoff.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Connect,
    Close,
    Shutdown,
}

/// Handle to a running manager; cheap to clone
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionLifecycle>,
}

impl ConnectionHandle {
    /// Ask for a connection; a no-op unless `Disconnected`
    pub fn connect(&self) -> SyncResult<()> {
        self.send(Command::Connect)
    }

    /// Tear the channel down and cancel any pending reconnect
    pub fn close(&self) -> SyncResult<()> {
        self.send(Command::Close)
    }

    /// Close and stop the manager task
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Consecutive failed attempts
    pub fn attempts(&self) -> u32 {
        self.status.borrow().attempts
    }

    /// Receiver notified on every lifecycle change
    pub fn status(&self) -> watch::Receiver<ConnectionLifecycle> {
        self.status.clone()
    }

    /// Wait until the manager reaches `state`
    pub async fn wait_for(&self, state: ConnectionState) -> SyncResult<()> {
        let mut status = self.status.clone();
        status
            .wait_for(|lifecycle| lifecycle.state == state)
            .await
            .map(|_| ())
            .map_err(|_| stopped())
    }

    fn send(&self, command: Command) -> SyncResult<()> {
        self.commands.send(command).map_err(|_| stopped())
    }
}

fn stopped() -> SyncError {
    SyncError::Transport("connection manager stopped".into())
}

/// Spawns the manager task
pub struct ConnectionManager;

impl ConnectionManager {
    /// Start a manager in `Disconnected`; call [`ConnectionHandle::connect`]
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        transport: Arc<dyn PushTransport>,
        api: Arc<dyn ApiClient>,
        store: Store,
        config: ManagerConfig,
    ) -> ConnectionHandle {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ConnectionLifecycle::default());

        let driver = Driver {
            lifecycle: ConnectionLifecycle::default(),
            transport,
            api,
            store,
            config,
            commands,
            status: status_tx,
        };
        tokio::spawn(driver.run());

        ConnectionHandle {
            commands: commands_tx,
            status,
        }
    }
}

/// Why a phase of the loop ended
enum Interrupt {
    Input(ConnectionInput, Option<String>),
    Stop,
}

struct Driver {
    lifecycle: ConnectionLifecycle,
    transport: Arc<dyn PushTransport>,
    api: Arc<dyn ApiClient>,
    store: Store,
    config: ManagerConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionLifecycle>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            let interrupt = match self.lifecycle.state {
                ConnectionState::Disconnected => self.idle().await,
                ConnectionState::Authenticating => match self.authenticate().await {
                    Ok(channel) => {
                        self.feed(ConnectionInput::TokenAccepted, None);
                        self.serve(channel).await
                    }
                    Err(interrupt) => interrupt,
                },
                // Connected is only ever entered from authenticate() above
                ConnectionState::Connected => {
                    Interrupt::Input(ConnectionInput::TransportError, Some("channel lost".into()))
                }
                ConnectionState::Reconnecting => self.wait_backoff().await,
            };

            match interrupt {
                Interrupt::Input(input, error) => {
                    self.feed(input, error);
                }
                Interrupt::Stop => break,
            }
        }

        self.feed(ConnectionInput::Close, None);
        info!("Connection manager stopped");
    }

    async fn idle(&mut self) -> Interrupt {
        match self.commands.recv().await {
            Some(Command::Connect) => Interrupt::Input(ConnectionInput::Connect, None),
            Some(Command::Close) => Interrupt::Input(ConnectionInput::Close, None),
            Some(Command::Shutdown) | None => Interrupt::Stop,
        }
    }

    async fn authenticate(&mut self) -> Result<Box<dyn PushChannel>, Interrupt> {
        let handshake = handshake(&*self.transport, &*self.api, self.config.auth_timeout);
        tokio::pin!(handshake);

        loop {
            tokio::select! {
                result = &mut handshake => {
                    return result.map_err(|e| match e {
                        SyncError::AuthRejected(reason) => {
                            Interrupt::Input(ConnectionInput::TokenRejected, Some(reason))
                        }
                        other => Interrupt::Input(ConnectionInput::TransportError, Some(other.to_string())),
                    });
                }
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => debug!("connect() while authenticating is a no-op"),
                    Some(Command::Close) => return Err(Interrupt::Input(ConnectionInput::Close, None)),
                    Some(Command::Shutdown) | None => return Err(Interrupt::Stop),
                },
            }
        }
    }

    async fn serve(&mut self, mut channel: Box<dyn PushChannel>) -> Interrupt {
        let period = self.config.heartbeat_interval;
        let mut heartbeat = time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut awaiting_pong = false;

        let interrupt = loop {
            tokio::select! {
                received = channel.recv() => match received {
                    None => break transport_error("channel closed by server"),
                    Some(Err(e)) if e.is_transport() => break transport_error(e.to_string()),
                    Some(Err(e)) => warn!(error = %e, "Dropping undecodable frame"),
                    Some(Ok(frame)) => match frame.kind.as_str() {
                        frame::PONG => awaiting_pong = false,
                        frame::PING => {
                            if let Err(e) = channel.send(Frame::pong()).await {
                                break transport_error(e.to_string());
                            }
                        }
                        _ if frame.is_control() => debug!(kind = %frame.kind, "Ignoring control frame"),
                        _ => {
                            if let Err(e) = self.route(&frame) {
                                warn!(error = %e, "Store rejected routed action");
                                break Interrupt::Stop;
                            }
                        }
                    },
                },
                _ = heartbeat.tick() => {
                    if awaiting_pong {
                        break transport_error("heartbeat not acknowledged");
                    }
                    if let Err(e) = channel.send(Frame::ping()).await {
                        break transport_error(e.to_string());
                    }
                    awaiting_pong = true;
                }
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => {
                        // The lifecycle rejects this; surface it at debug only
                        self.feed(ConnectionInput::Connect, None);
                    }
                    Some(Command::Close) => break Interrupt::Input(ConnectionInput::Close, None),
                    Some(Command::Shutdown) | None => break Interrupt::Stop,
                },
            }
        };

        channel.close().await;
        interrupt
    }

    async fn wait_backoff(&mut self) -> Interrupt {
        let delay = self.config.backoff.delay(self.lifecycle.attempts);
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Interrupt::Input(ConnectionInput::BackoffElapsed, None),
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => debug!("connect() while reconnecting is a no-op"),
                    Some(Command::Close) => return Interrupt::Input(ConnectionInput::Close, None),
                    Some(Command::Shutdown) | None => return Interrupt::Stop,
                },
            }
        }
    }

    fn route(&self, frame: &Frame) -> SyncResult<()> {
        match route(frame) {
            Routed::Action(action) => {
                debug!(kind = %frame.kind, action = action.kind(), "Routing push frame");
                self.store.dispatch(action)
            }
            Routed::Unknown => {
                warn!(kind = %frame.kind, "Dropping push frame with unknown kind");
                Ok(())
            }
            Routed::Malformed(error) => {
                warn!(kind = %frame.kind, %error, "Dropping malformed push frame");
                Ok(())
            }
        }
    }

    fn feed(&mut self, input: ConnectionInput, error: Option<String>) {
        let (next, effect) = match self.lifecycle.transition(&input) {
            Ok(step) => step,
            Err(e) => {
                debug!(error = %e, ?input, "Ignoring connection input");
                return;
            }
        };

        match effect {
            ConnectionEffect::ScheduleReconnect { attempt } => warn!(
                attempt,
                delay_ms = self.config.backoff.delay(attempt).as_millis() as u64,
                error = error.as_deref().unwrap_or_default(),
                "Push channel lost, scheduling reconnect"
            ),
            ConnectionEffect::TearDown if input == ConnectionInput::TokenRejected => warn!(
                reason = error.as_deref().unwrap_or_default(),
                "Push channel authentication rejected"
            ),
            ConnectionEffect::OpenChannel | ConnectionEffect::TearDown | ConnectionEffect::None => {}
        }

        if next == self.lifecycle {
            return;
        }
        info!(from = %self.lifecycle.state, to = %next.state, attempts = next.attempts, "Connection state changed");
        self.lifecycle = next;

        // Mirror into the store before publishing, so waiters see both
        let changed = Action::ConnectionChanged {
            state: next.state,
            attempts: next.attempts,
            error,
        };
        if self.store.dispatch(changed).is_err() {
            debug!("Store closed; connection state not mirrored");
        }
        self.status.send_replace(next);
    }
}

fn transport_error(message: impl Into<String>) -> Interrupt {
    Interrupt::Input(ConnectionInput::TransportError, Some(message.into()))
}

/// Open a channel, present a fresh token and wait for acceptance
async fn handshake(
    transport: &dyn PushTransport,
    api: &dyn ApiClient,
    auth_timeout: Duration,
) -> SyncResult<Box<dyn PushChannel>> {
    let mut channel = transport.open().await?;

    let result: SyncResult<()> = async {
        let token = api::fetch_push_token(api).await?;
        channel.send(Frame::auth(&token)).await?;
        time::timeout(auth_timeout, await_acceptance(&mut *channel))
            .await
            .map_err(|_| SyncError::Timeout("auth handshake".into()))?
    }
    .await;

    match result {
        Ok(()) => Ok(channel),
        Err(e) => {
            channel.close().await;
            Err(e)
        }
    }
}

async fn await_acceptance(channel: &mut dyn PushChannel) -> SyncResult<()> {
    loop {
        match channel.recv().await {
            None => return Err(SyncError::Transport("channel closed during handshake".into())),
            Some(Err(e)) if e.is_transport() => return Err(e),
            Some(Err(e)) => warn!(error = %e, "Dropping undecodable frame during handshake"),
            Some(Ok(frame)) => match frame.kind.as_str() {
                frame::AUTH_OK => return Ok(()),
                frame::AUTH_REJECTED => return Err(SyncError::AuthRejected(frame.reason())),
                _ => debug!(kind = %frame.kind, "Discarding frame received before acceptance"),
            },
        }
    }
}
