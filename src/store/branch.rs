// Copyright (c) 2025 - Cowboy AI, Inc.
//! Branch reducer abstraction
//!
//! A branch is an independently addressable region of the store. Each
//! branch owns exactly one reducer, a pure function
//!
//! ```text
//! (&Branch, &Action) → Option<Branch>
//! ```
//!
//! where `None` means "this action does not concern me". The store keeps the
//! previous `Arc` in that case, so selector subscribers can detect change by
//! pointer identity alone.

use std::fmt::Debug;
use std::sync::Arc;

use crate::action::Action;

/// A reducible region of the store
pub trait Branch: Clone + Debug + Default + Send + Sync + 'static {
    /// Name used in logs
    const NAME: &'static str;

    /// Reduce an action; `None` leaves the branch untouched
    ///
    /// Must be pure and total: no I/O, no panics, unrecognized actions
    /// return `None`.
    fn reduce(&self, action: &Action) -> Option<Self>;
}

/// Apply `action` to a shared branch, preserving identity on no-op
pub fn apply<B: Branch>(branch: &Arc<B>, action: &Action) -> Arc<B> {
    match branch.reduce(action) {
        Some(next) => Arc::new(next),
        None => Arc::clone(branch),
    }
}

/// What a data panel should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    /// Request outstanding, or nothing requested yet
    Loading,
    /// Data present and current
    Loaded,
    /// Last request failed
    LoadFailed,
}

/// A fetched value together with its request status
///
/// A failure keeps whatever data was already present; it only raises the
/// `load_error` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Loadable<T> {
    /// Last successfully loaded value
    pub data: Option<T>,
    /// A request is outstanding
    pub loading: bool,
    /// Message of the last failed request, cleared by the next request
    pub load_error: Option<String>,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            load_error: None,
        }
    }
}

impl<T: Clone> Loadable<T> {
    /// Mark a request as outstanding
    pub fn pending(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: true,
            load_error: None,
        }
    }

    /// Record a successful response
    pub fn loaded(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            load_error: None,
        }
    }

    /// Record a failed response
    pub fn failed(&self, message: impl Into<String>) -> Self {
        Self {
            data: self.data.clone(),
            loading: false,
            load_error: Some(message.into()),
        }
    }
}

impl<T> Loadable<T> {
    /// Resolve to exactly one of the three panel states
    pub fn status(&self) -> PanelStatus {
        if self.loading {
            PanelStatus::Loading
        } else if self.load_error.is_some() {
            PanelStatus::LoadFailed
        } else if self.data.is_some() {
            PanelStatus::Loaded
        } else {
            PanelStatus::Loading
        }
    }
}
