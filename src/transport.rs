// Copyright (c) 2025 - Cowboy AI, Inc.
//! Push channel transports
//!
//! The connection manager owns exactly one [`PushChannel`] at a time and
//! obtains it from a [`PushTransport`]. Two transports ship with the crate:
//!
//! - [`MemoryTransport`]: an in-process loopback whose server half is driven
//!   by tests or embedding code
//! - [`NatsTransport`]: frames published on `{prefix}.{session}.up` and
//!   received on `{prefix}.{session}.down`

pub mod memory;
pub mod nats;

pub use memory::{memory_transport, MemoryServer, MemoryTransport, ServerConnection};
pub use nats::NatsTransport;

use async_trait::async_trait;

use crate::connection::Frame;
use crate::errors::SyncResult;

/// Opens push channels
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Open a fresh channel; transport failures are [`SyncError::Transport`]
    ///
    /// [`SyncError::Transport`]: crate::errors::SyncError::Transport
    async fn open(&self) -> SyncResult<Box<dyn PushChannel>>;
}

/// One open, bidirectional push channel
#[async_trait]
pub trait PushChannel: Send {
    /// Send a frame to the server
    async fn send(&mut self, frame: Frame) -> SyncResult<()>;

    /// Receive the next frame
    ///
    /// `None` means the server closed the channel. A frame that could not be
    /// decoded is `Some(Err(SyncError::Serialization(_)))` and does not end
    /// the channel. Must be cancel-safe.
    async fn recv(&mut self) -> Option<SyncResult<Frame>>;

    /// Tear the channel down
    async fn close(&mut self);
}
