// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory loopback transport

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{PushChannel, PushTransport};
use crate::connection::Frame;
use crate::errors::{SyncError, SyncResult};

#[derive(Debug, Default)]
struct Shared {
    refusing: AtomicBool,
    opens: AtomicUsize,
}

/// Client half of the loopback
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    accept: mpsc::UnboundedSender<ServerConnection>,
    shared: Arc<Shared>,
}

/// Server half of the loopback; accepts every channel the client opens
#[derive(Debug)]
pub struct MemoryServer {
    incoming: mpsc::UnboundedReceiver<ServerConnection>,
    shared: Arc<Shared>,
}

/// Create a connected transport/server pair
pub fn memory_transport() -> (MemoryTransport, MemoryServer) {
    let (accept, incoming) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::default());
    (
        MemoryTransport {
            accept,
            shared: Arc::clone(&shared),
        },
        MemoryServer { incoming, shared },
    )
}

impl MemoryServer {
    /// Wait for the client to open the next channel
    pub async fn accept(&mut self) -> Option<ServerConnection> {
        self.incoming.recv().await
    }

    /// A channel already opened, if any
    pub fn try_accept(&mut self) -> Option<ServerConnection> {
        self.incoming.try_recv().ok()
    }

    /// Make `open` fail until switched back
    pub fn set_refusing(&self, refusing: bool) {
        self.shared.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Number of `open` calls, successful or not
    pub fn opens(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushTransport for MemoryTransport {
    async fn open(&self) -> SyncResult<Box<dyn PushChannel>> {
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        if self.shared.refusing.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("connection refused".into()));
        }

        let (up_tx, up_rx) = mpsc::unbounded_channel();
        let (down_tx, down_rx) = mpsc::unbounded_channel();

        self.accept
            .send(ServerConnection {
                inbound: up_rx,
                outbound: down_tx,
            })
            .map_err(|_| SyncError::Transport("server is gone".into()))?;

        Ok(Box::new(MemoryChannel {
            outbound: Some(up_tx),
            inbound: down_rx,
        }))
    }
}

struct MemoryChannel {
    outbound: Option<mpsc::UnboundedSender<Frame>>,
    inbound: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl PushChannel for MemoryChannel {
    async fn send(&mut self, frame: Frame) -> SyncResult<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| SyncError::Transport("channel closed".into()))?;
        outbound
            .send(frame)
            .map_err(|_| SyncError::Transport("server closed the channel".into()))
    }

    async fn recv(&mut self) -> Option<SyncResult<Frame>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.outbound = None;
        self.inbound.close();
    }
}

/// Server end of one open channel; dropping it closes the channel
#[derive(Debug)]
pub struct ServerConnection {
    inbound: mpsc::UnboundedReceiver<Frame>,
    outbound: mpsc::UnboundedSender<Frame>,
}

impl ServerConnection {
    /// Next frame sent by the client; `None` once the client closed
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    /// A frame already sent by the client, if any
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.inbound.try_recv().ok()
    }

    /// Send a frame to the client
    pub fn send(&self, frame: Frame) -> SyncResult<()> {
        self.outbound
            .send(frame)
            .map_err(|_| SyncError::Transport("client closed the channel".into()))
    }

    /// Whether the client has closed its end
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}
