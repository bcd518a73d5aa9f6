// Copyright (c) 2025 - Cowboy AI, Inc.
//! Push Channel Connection Lifecycle
//!
//! Formal FSM for the push channel, driven exclusively by the connection
//! manager.
//!
//! # States
//!
//! - Disconnected: No channel; initial state and state after teardown
//! - Authenticating: Channel open, auth token sent, waiting for acceptance
//! - Connected: Token accepted; domain frames are routed
//! - Reconnecting: Waiting out the backoff delay after a transport error
//!
//! # Transitions
//!
//! ```text
//! Disconnected  --Connect-------->  Authenticating
//! Authenticating --TokenAccepted-->  Connected        (attempts := 0)
//! Authenticating --TokenRejected-->  Disconnected     (no retry)
//! Authenticating --TransportError->  Reconnecting     (attempts += 1)
//! Connected     --TransportError->  Reconnecting     (attempts += 1)
//! Reconnecting  --BackoffElapsed->  Authenticating
//! any           --Close---------->  Disconnected     (attempts := 0)
//! ```
//!
//! `Connect` in `Authenticating` or `Reconnecting` is accepted as a no-op.
//! `Connect` while `Connected` is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    /// No channel
    #[default]
    Disconnected,
    /// Handshake in progress
    Authenticating,
    /// Handshake accepted
    Connected,
    /// Waiting to retry
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Authenticating => write!(f, "authenticating"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// FSM input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionInput {
    /// Caller asked for a connection
    Connect,
    /// Server echoed acceptance of the auth token
    TokenAccepted,
    /// Server refused the auth token
    TokenRejected,
    /// Channel dropped, failed to open, or missed a heartbeat
    TransportError,
    /// Reconnect delay has passed
    BackoffElapsed,
    /// Owner tore the channel down
    Close,
}

/// Work the manager must perform after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEffect {
    /// Nothing to do
    None,
    /// Open the channel and run the auth handshake
    OpenChannel,
    /// Sleep for the backoff delay of this attempt, then feed `BackoffElapsed`
    ScheduleReconnect { attempt: u32 },
    /// Close the channel and cancel any pending reconnect
    TearDown,
}

/// Connection state plus the consecutive-failure counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionLifecycle {
    /// Current state
    pub state: ConnectionState,
    /// Consecutive failed attempts since the last successful connect
    pub attempts: u32,
}

impl ConnectionLifecycle {
    fn to(self, state: ConnectionState) -> Self {
        Self { state, ..self }
    }

    fn invalid(&self, input: &ConnectionInput) -> TransitionError {
        TransitionError::InvalidTransition {
            from: self.state.to_string(),
            input: format!("{input:?}"),
        }
    }
}

impl StateMachine for ConnectionLifecycle {
    type Input = ConnectionInput;
    type Output = ConnectionEffect;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use ConnectionInput::*;
        use ConnectionState::*;

        match (self.state, input) {
            (_, Close) => Ok((
                ConnectionLifecycle {
                    state: Disconnected,
                    attempts: 0,
                },
                ConnectionEffect::TearDown,
            )),

            (Disconnected, Connect) => Ok((self.to(Authenticating), ConnectionEffect::OpenChannel)),
            (Authenticating | Reconnecting, Connect) => Ok((*self, ConnectionEffect::None)),
            (Connected, Connect) => Err(TransitionError::PreconditionFailed(
                "already connected".to_string(),
            )),

            (Authenticating, TokenAccepted) => Ok((
                ConnectionLifecycle {
                    state: Connected,
                    attempts: 0,
                },
                ConnectionEffect::None,
            )),
            (Authenticating, TokenRejected) => Ok((
                ConnectionLifecycle {
                    state: Disconnected,
                    attempts: 0,
                },
                ConnectionEffect::TearDown,
            )),

            (Authenticating | Connected, TransportError) => {
                let attempts = self.attempts.saturating_add(1);
                Ok((
                    ConnectionLifecycle {
                        state: Reconnecting,
                        attempts,
                    },
                    ConnectionEffect::ScheduleReconnect { attempt: attempts },
                ))
            }

            (Reconnecting, BackoffElapsed) => {
                Ok((self.to(Authenticating), ConnectionEffect::OpenChannel))
            }

            _ => Err(self.invalid(input)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn at(state: ConnectionState, attempts: u32) -> ConnectionLifecycle {
        ConnectionLifecycle { state, attempts }
    }

    #[test]
    fn test_happy_path() {
        let (auth, effect) = ConnectionLifecycle::default()
            .transition(&ConnectionInput::Connect)
            .unwrap();
        assert_eq!(auth.state, ConnectionState::Authenticating);
        assert_eq!(effect, ConnectionEffect::OpenChannel);

        let (connected, _) = auth.transition(&ConnectionInput::TokenAccepted).unwrap();
        assert_eq!(connected, at(ConnectionState::Connected, 0));
    }

    #[test_case(ConnectionState::Authenticating ; "while authenticating")]
    #[test_case(ConnectionState::Reconnecting ; "while reconnecting")]
    fn test_connect_is_reentrant_noop(state: ConnectionState) {
        let lifecycle = at(state, 3);
        let (next, effect) = lifecycle.transition(&ConnectionInput::Connect).unwrap();
        assert_eq!(next, lifecycle);
        assert_eq!(effect, ConnectionEffect::None);
    }

    #[test]
    fn test_connect_while_connected_rejected() {
        let result = at(ConnectionState::Connected, 0).transition(&ConnectionInput::Connect);
        assert!(matches!(result, Err(TransitionError::PreconditionFailed(_))));
    }

    #[test]
    fn test_transport_errors_count_attempts() {
        let mut lifecycle = at(ConnectionState::Connected, 0);
        for expected in 1..=3u32 {
            let (reconnecting, effect) = lifecycle
                .transition(&ConnectionInput::TransportError)
                .unwrap();
            assert_eq!(reconnecting.state, ConnectionState::Reconnecting);
            assert_eq!(effect, ConnectionEffect::ScheduleReconnect { attempt: expected });

            let (authenticating, _) = reconnecting
                .transition(&ConnectionInput::BackoffElapsed)
                .unwrap();
            lifecycle = authenticating;
        }
        assert_eq!(lifecycle.attempts, 3);

        let (connected, _) = lifecycle.transition(&ConnectionInput::TokenAccepted).unwrap();
        assert_eq!(connected.attempts, 0);
    }

    #[test]
    fn test_rejection_does_not_schedule_retry() {
        let (next, effect) = at(ConnectionState::Authenticating, 2)
            .transition(&ConnectionInput::TokenRejected)
            .unwrap();
        assert_eq!(next.state, ConnectionState::Disconnected);
        assert_eq!(effect, ConnectionEffect::TearDown);
    }

    #[test_case(ConnectionState::Disconnected)]
    #[test_case(ConnectionState::Authenticating)]
    #[test_case(ConnectionState::Connected)]
    #[test_case(ConnectionState::Reconnecting)]
    fn test_close_from_any_state(state: ConnectionState) {
        let (next, effect) = at(state, 5).transition(&ConnectionInput::Close).unwrap();
        assert_eq!(next, at(ConnectionState::Disconnected, 0));
        assert_eq!(effect, ConnectionEffect::TearDown);
    }

    #[test]
    fn test_token_frames_outside_handshake_are_invalid() {
        assert!(!at(ConnectionState::Connected, 0).can_transition(&ConnectionInput::TokenAccepted));
        assert!(!at(ConnectionState::Disconnected, 0).can_transition(&ConnectionInput::TransportError));
        assert!(!at(ConnectionState::Connected, 0).can_transition(&ConnectionInput::BackoffElapsed));
    }
}
