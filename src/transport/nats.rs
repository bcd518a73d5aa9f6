// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS push transport
//!
//! Each session gets a pair of subjects:
//!
//! ```text
//! {prefix}.{session}.up    client -> server (auth, pong, ping)
//! {prefix}.{session}.down  server -> client (auth_ok, domain frames)
//! ```
//!
//! Frames are JSON encoded. The underlying NATS client reconnects on its
//! own; the manager's heartbeat is what detects a dead session.

use async_nats::{Client, ConnectOptions, Subscriber};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{PushChannel, PushTransport};
use crate::config::PushConfig;
use crate::connection::Frame;
use crate::errors::{SyncError, SyncResult};

/// Push transport over a shared NATS connection
#[derive(Clone)]
pub struct NatsTransport {
    client: Client,
    prefix: String,
    session: String,
}

impl NatsTransport {
    /// Connect to the configured servers with a fresh session id
    pub async fn connect(config: &PushConfig) -> SyncResult<Self> {
        let options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout);

        let client = async_nats::connect_with_options(config.servers.join(","), options)
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        info!("Connected to NATS at {:?}", config.servers);

        Ok(Self::with_client(
            client,
            config.subject_prefix.clone(),
            Uuid::now_v7().to_string(),
        ))
    }

    /// Wrap an existing client
    pub fn with_client(client: Client, prefix: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            session: session.into(),
        }
    }

    /// Session id embedded in the subjects
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Subject the client publishes on
    pub fn up_subject(&self) -> String {
        subject(&self.prefix, &self.session, "up")
    }

    /// Subject the server publishes on
    pub fn down_subject(&self) -> String {
        subject(&self.prefix, &self.session, "down")
    }
}

fn subject(prefix: &str, session: &str, direction: &str) -> String {
    format!("{prefix}.{session}.{direction}")
}

#[async_trait]
impl PushTransport for NatsTransport {
    async fn open(&self) -> SyncResult<Box<dyn PushChannel>> {
        let down = self.down_subject();
        let subscriber = self
            .client
            .subscribe(down.clone())
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        info!("Subscribed to subject: {}", down);

        Ok(Box::new(NatsChannel {
            client: self.client.clone(),
            up: self.up_subject(),
            subscriber,
        }))
    }
}

struct NatsChannel {
    client: Client,
    up: String,
    subscriber: Subscriber,
}

#[async_trait]
impl PushChannel for NatsChannel {
    async fn send(&mut self, frame: Frame) -> SyncResult<()> {
        let payload = serde_json::to_vec(&frame)?;

        self.client
            .publish(self.up.clone(), payload.into())
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        debug!("Published {} frame to subject: {}", frame.kind, self.up);
        Ok(())
    }

    async fn recv(&mut self) -> Option<SyncResult<Frame>> {
        let message = self.subscriber.next().await?;
        Some(serde_json::from_slice::<Frame>(&message.payload).map_err(SyncError::from))
    }

    async fn close(&mut self) {
        if let Err(e) = self.subscriber.unsubscribe().await {
            warn!("Failed to unsubscribe push channel: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Connecting needs a running server; only the subject layout is checked here
    #[test]
    fn test_subject_layout() {
        assert_eq!(subject("survey.push", "0192", "up"), "survey.push.0192.up");
        assert_eq!(subject("survey.push", "0192", "down"), "survey.push.0192.down");
    }
}
