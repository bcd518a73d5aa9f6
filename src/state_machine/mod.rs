// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Generic state machine types for modeling lifecycles. All state machines
//! are pure: a transition is a deterministic function of the current state
//! and the input, and any I/O the transition implies is returned as an
//! output value for the caller to perform.
//!
//! This is a **Mealy Machine** formulation, the output depends on both the
//! current state and the input:
//!
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! # Example
//!
//! ```rust
//! use survey_sync::state_machine::*;
//!
//! let lifecycle = ConnectionLifecycle::default();
//! let (next, effect) = lifecycle.transition(&ConnectionInput::Connect).unwrap();
//! assert_eq!(next.state, ConnectionState::Authenticating);
//! assert_eq!(effect, ConnectionEffect::OpenChannel);
//! ```

pub mod connection_lifecycle;

pub use connection_lifecycle::{
    ConnectionEffect, ConnectionInput, ConnectionLifecycle, ConnectionState,
};

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Errors that can occur during state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Transition from current state to target state is not allowed
    #[error("Invalid transition from {from} on {input}")]
    InvalidTransition { from: String, input: String },

    /// Precondition not met for transition
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
}

/// A pure finite state machine
///
/// The connection manager drives one of these and performs the returned
/// effects itself.
pub trait StateMachine: Sized + Clone {
    /// What the outside world reports
    type Input;

    /// Effect the caller must carry out
    type Output;

    /// Next state and effect for `input`, or why `input` is not accepted here
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    /// Check if a transition is valid without performing it
    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }
}

/// Structural invariants of a value
///
/// Must hold after every operation that mutates the value.
pub trait StateInvariant {
    /// Describe the first violated invariant, if any
    fn check_invariants(&self) -> Result<(), String>;
}
