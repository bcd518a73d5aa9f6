// Copyright (c) 2025 - Cowboy AI, Inc.
//! Headless Sync Session
//!
//! Connects to the push channel and the request/response API, keeps a store
//! in sync and logs what changes. Useful for watching a deployment's push
//! traffic without a UI.
//!
//! Run with: cargo run --bin survey-sync --features http -- [SOURCE_ID]
//!
//! Prerequisites:
//! 1. NATS server carrying the push channel (SURVEY_NATS_URL)
//! 2. API reachable at SURVEY_API_URL with a token in SURVEY_API_TOKEN

use std::sync::Arc;

use anyhow::{Context, Result};
use survey_sync::api::HttpApiClient;
use survey_sync::model::ObjId;
use survey_sync::transport::NatsTransport;
use survey_sync::{Navigation, Session, SyncConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting survey sync session");

    let config = SyncConfig::from_env().context("Invalid SURVEY_* configuration")?;
    info!("API: {}", config.api.base_url);
    info!("Push: {:?} ({})", config.push.servers, config.push.subject_prefix);

    let api = HttpApiClient::new(config.api.clone()).context("Failed to build API client")?;
    let transport = NatsTransport::connect(&config.push)
        .await
        .context("Failed to connect to NATS")?;
    info!("Push session id: {}", transport.session());

    let session = Session::start(&config, Arc::new(api), Arc::new(transport));

    let _connection = session.store().subscribe(
        |state| Arc::clone(&state.connection),
        |connection| {
            info!(
                state = %connection.state,
                attempts = connection.attempts,
                "Push channel {}",
                connection.state
            )
        },
    );
    let _source = session.store().subscribe(
        |state| Arc::clone(&state.current_source),
        |current| {
            if let Some(source) = &current.source {
                info!(obj_id = %source.id, comments = source.comments.len(), "Source updated");
            }
        },
    );
    let _notifications = session.store().subscribe(
        |state| Arc::clone(&state.notifications),
        |notifications| {
            if let Some(note) = notifications.items.back() {
                info!(level = ?note.level, "{}", note.note);
            }
        },
    );

    session.connect()?;
    session.thunks().fetch_profile().await?;
    session.thunks().fetch_groups().await?;

    if let Some(obj_id) = std::env::args().nth(1) {
        match session.navigate_to_source(ObjId::new(obj_id)).await? {
            Navigation::Fetched(outcome) if !outcome.is_loaded() => {
                warn!(?outcome, "Initial source fetch did not load")
            }
            navigation => info!(?navigation, "Navigated"),
        }
    }

    info!("Session running, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutting down");
    session.shutdown().await;

    Ok(())
}
