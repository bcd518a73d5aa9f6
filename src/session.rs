// Copyright (c) 2025 - Cowboy AI, Inc.
//! A synchronization session
//!
//! Owns one store and wires its writers and consumers together:
//!
//! ```text
//!                 ┌──────────── Session ────────────┐
//!  push frames ──>│ ConnectionManager ──┐           │
//!                 │                     ├──> Store ─┼──> subscribers
//!  API results ──>│ Thunks ─────────────┘     │     │
//!                 │   ^                       │     │
//!                 │   └── refresh effects <───┘     │
//!                 │ RouteGuard, SharingCoordinator  │
//!                 └─────────────────────────────────┘
//! ```
//!
//! Refresh effects turn server announcements into re-fetches:
//! `REFRESH_SOURCE` for the source the route targets re-fetches it together
//! with any photometry or spectra already loaded for it; `REFRESH_GROUP` and
//! `REFRESH_PROFILE` re-fetch groups and the profile.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::action::Action;
use crate::api::{self, ApiClient};
use crate::config::SyncConfig;
use crate::connection::{ConnectionHandle, ConnectionManager, ManagerConfig};
use crate::errors::SyncResult;
use crate::model::ObjId;
use crate::route::{Coherency, RouteGuard};
use crate::sharing::SharingCoordinator;
use crate::store::{AppState, Store, Subscription};
use crate::thunks::{FetchOutcome, Thunks};
use crate::transport::PushTransport;

/// Result of a navigation
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// The route's fetch was issued and settled
    Fetched(FetchOutcome),
    /// No fetch was issued; the check reported this
    Skipped(Coherency),
}

/// Store, writers and consumers of one client session
pub struct Session {
    store: Store,
    thunks: Thunks,
    sharing: SharingCoordinator,
    connection: ConnectionHandle,
    route: Arc<Mutex<RouteGuard>>,
    _effects: Subscription,
}

impl Session {
    /// Build a session; the push channel stays disconnected until
    /// [`Session::connect`]
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: &SyncConfig,
        api: Arc<dyn ApiClient>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        let store = Store::new(AppState::with_plot_capacity(config.plot_cache_capacity));
        let thunks = Thunks::new(store.clone(), Arc::clone(&api));
        let sharing = SharingCoordinator::new(store.clone(), Arc::clone(&api));
        let connection = ConnectionManager::spawn(
            transport,
            api,
            store.clone(),
            ManagerConfig::from(&config.push),
        );

        let effects = {
            let thunks = thunks.clone();
            store.on_action(move |action, state| refresh(&thunks, action, state))
        };

        info!(plot_cache_capacity = config.plot_cache_capacity, "Session started");

        Self {
            store,
            thunks,
            sharing,
            connection,
            route: Arc::new(Mutex::new(RouteGuard::new())),
            _effects: effects,
        }
    }

    /// Store shared by every writer of the session
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Action creators for API fetches
    pub fn thunks(&self) -> &Thunks {
        &self.thunks
    }

    /// Share selection and submission
    pub fn sharing(&self) -> &SharingCoordinator {
        &self.sharing
    }

    /// Handle to the push channel's connection manager
    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Open the push channel
    pub fn connect(&self) -> SyncResult<()> {
        self.connection.connect()
    }

    /// Point the source route at `obj_id` and fetch it if the store is not
    /// coherent with the route
    pub async fn navigate_to_source(&self, obj_id: ObjId) -> SyncResult<Navigation> {
        let is_new = self.guard().navigate(obj_id.clone());
        if is_new {
            self.register_view(obj_id);
        }
        self.evaluate_route().await
    }

    /// Re-run the coherency check for the current route
    ///
    /// Repeated calls during one navigation issue at most one fetch.
    pub async fn evaluate_route(&self) -> SyncResult<Navigation> {
        self.store.flush().await?;
        let state = self.store.state();

        let (fetch, coherency) = {
            let mut guard = self.guard();
            (guard.evaluate(&state.current_source), guard.coherency(&state.current_source))
        };

        match (fetch, coherency) {
            (Some(obj_id), _) => {
                let outcome = self.thunks.fetch_source(obj_id).await?;
                Ok(Navigation::Fetched(outcome))
            }
            (None, Some(coherency)) => Ok(Navigation::Skipped(coherency)),
            (None, None) => Ok(Navigation::Skipped(Coherency::NeedsFetch)),
        }
    }

    /// Allow the current route to fetch again after a failure
    pub async fn retry(&self) -> SyncResult<Navigation> {
        self.guard().retry();
        self.evaluate_route().await
    }

    /// Coherency of the current route, if one is set
    pub fn coherency(&self) -> Option<Coherency> {
        self.guard().coherency(&self.store.state().current_source)
    }

    /// Close the push channel and stop the store
    pub async fn shutdown(&self) {
        if let Err(e) = self.connection.close() {
            debug!(error = %e, "Connection manager already stopped");
        }
        self.connection.shutdown();
        let _ = self.store.flush().await;
        self.store.shutdown();
        info!("Session stopped");
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, RouteGuard> {
        self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register_view(&self, obj_id: ObjId) {
        let api = Arc::clone(self.thunks.api());
        tokio::spawn(async move {
            if let Err(e) = api::register_source_view(&*api, &obj_id).await {
                warn!(%obj_id, error = %e, "Failed to register source view");
            }
        });
    }
}

/// Re-fetch whatever a server announcement made stale
///
/// Runs on the dispatcher; every fetch is spawned.
fn refresh(thunks: &Thunks, action: &Action, state: &Arc<AppState>) {
    match action {
        Action::RefreshSource { obj_id } => {
            // Only the route's target is re-fetched; a source still displayed
            // while another one loads is about to be replaced
            if state.current_source.requested.as_ref() != Some(obj_id) {
                debug!(%obj_id, "Refresh for a source the route does not target");
                return;
            }
            spawn_fetch("source", {
                let (thunks, obj_id) = (thunks.clone(), obj_id.clone());
                async move { thunks.refresh_source(obj_id).await }
            });
            if state.photometry.get(obj_id).is_some() {
                spawn_fetch("photometry", {
                    let (thunks, obj_id) = (thunks.clone(), obj_id.clone());
                    async move { thunks.fetch_photometry(obj_id).await }
                });
            }
            if state.spectra.get(obj_id).is_some() {
                spawn_fetch("spectra", {
                    let (thunks, obj_id) = (thunks.clone(), obj_id.clone());
                    async move { thunks.fetch_spectra(obj_id).await }
                });
            }
        }
        Action::RefreshGroup { group_id } => {
            debug!(group_id = group_id.0, "Group changed");
            spawn_fetch("groups", {
                let thunks = thunks.clone();
                async move { thunks.fetch_groups().await }
            });
        }
        Action::RefreshProfile => spawn_fetch("profile", {
            let thunks = thunks.clone();
            async move { thunks.fetch_profile().await }
        }),
        _ => {}
    }
}

fn spawn_fetch<F>(what: &'static str, fetch: F)
where
    F: std::future::Future<Output = SyncResult<FetchOutcome>> + Send + 'static,
{
    tokio::spawn(async move {
        match fetch.await {
            Ok(outcome) => debug!(what, ?outcome, "Refresh settled"),
            Err(e) => debug!(what, error = %e, "Refresh abandoned"),
        }
    });
}
