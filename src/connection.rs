// Copyright (c) 2025 - Cowboy AI, Inc.
//! Push-Channel Connection Manager
//!
//! - [`frame`]: the `{kind, data}` frame and control kinds
//! - [`routing`]: the fixed frame-kind to action table
//! - [`backoff`]: bounded exponential reconnect delays
//! - [`manager`]: the task owning the channel

pub mod backoff;
pub mod frame;
pub mod manager;
pub mod routing;

pub use backoff::BackoffPolicy;
pub use frame::Frame;
pub use manager::{ConnectionHandle, ConnectionManager, ManagerConfig};
pub use routing::{route, Routed, ROUTES};
