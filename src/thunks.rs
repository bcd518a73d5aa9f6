// Copyright (c) 2025 - Cowboy AI, Inc.
//! Async action creators
//!
//! Each thunk maps one resource call to exactly one pending action and one
//! terminal action:
//!
//! ```text
//! dispatch FETCH_X ──> await request ──> dispatch FETCH_X_OK | FETCH_X_FAIL
//! ```
//!
//! The pending action is applied before the request is issued and the
//! terminal action only after the request settles. Both carry the same
//! correlation id. Reducers never perform I/O; thunks never touch state
//! except through dispatch.
//!
//! # Stale responses
//!
//! Requests tagged with a route identifier (the current source, the source
//! list page) are checked again when they settle. If the route has moved on
//! the result is dropped with [`FetchOutcome::Stale`] and nothing is
//! dispatched. Reducers apply the same guard, so a response that slips past
//! this check is still ignored.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::api::{self, ApiClient};
use crate::cache::Fingerprint;
use crate::errors::{SyncError, SyncResult};
use crate::model::{ObjId, PlotKind};
use crate::store::Store;

/// How a thunk ended
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The `_OK` action was applied
    Loaded,
    /// The `_FAIL` action was applied; the error is recorded in state
    Failed(SyncError),
    /// The route moved on while the request was in flight
    Stale,
    /// Served from the derived cache without a request
    Cached,
    /// An identical request is already in flight
    InFlight,
}

impl FetchOutcome {
    /// Whether the data is now in the store
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded | FetchOutcome::Cached)
    }
}

/// Async action creators bound to a store and an API client
#[derive(Clone)]
pub struct Thunks {
    store: Store,
    api: Arc<dyn ApiClient>,
}

impl Thunks {
    /// Action creators dispatching into `store` and fetching through `api`
    pub fn new(store: Store, api: Arc<dyn ApiClient>) -> Self {
        Self { store, api }
    }

    /// Store the thunks dispatch into
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// API client the thunks fetch through
    pub fn api(&self) -> &Arc<dyn ApiClient> {
        &self.api
    }

    /// Fetch the source shown by the source page
    pub async fn fetch_source(&self, obj_id: ObjId) -> SyncResult<FetchOutcome> {
        let correlation = Uuid::now_v7();
        self.pending(Action::FetchSource { obj_id: obj_id.clone() }, correlation)
            .await?;

        let result = api::fetch_source(&*self.api, &obj_id).await;

        let requested = self.store.state().current_source.requested.clone();
        if requested.as_ref() != Some(&obj_id) {
            return Ok(stale(SyncError::StaleResponse(obj_id.to_string())));
        }

        let id = obj_id.clone();
        self.settle(
            correlation,
            result,
            move |source| Action::FetchSourceOk { obj_id, source },
            move |message| Action::FetchSourceFail { obj_id: id, message },
        )
        .await
    }

    /// Re-fetch the route's source after the server announced a change
    ///
    /// Leaves `requested` alone, so a navigation that starts meanwhile keeps
    /// its target and the refreshed copy is discarded. A failed refresh keeps
    /// the displayed source as it is.
    pub async fn refresh_source(&self, obj_id: ObjId) -> SyncResult<FetchOutcome> {
        let result = api::fetch_source(&*self.api, &obj_id).await;

        let requested = self.store.state().current_source.requested.clone();
        if requested.as_ref() != Some(&obj_id) {
            return Ok(stale(SyncError::StaleResponse(obj_id.to_string())));
        }

        match result {
            Ok(source) => {
                self.store
                    .dispatch_and_wait(Action::FetchSourceOk { obj_id, source })
                    .await?;
                Ok(FetchOutcome::Loaded)
            }
            Err(e) => {
                warn!(%obj_id, error = %e, "Source refresh failed");
                Ok(FetchOutcome::Failed(e))
            }
        }
    }

    /// Fetch one page of the source list
    pub async fn fetch_sources(&self, page_number: u32) -> SyncResult<FetchOutcome> {
        let correlation = Uuid::now_v7();
        self.pending(Action::FetchSources { page_number }, correlation)
            .await?;

        let result = api::fetch_sources(&*self.api, page_number).await;

        if self.store.state().source_list.requested_page != Some(page_number) {
            return Ok(stale(SyncError::StaleResponse(format!("page {page_number}"))));
        }

        self.settle(
            correlation,
            result,
            |page| Action::FetchSourcesOk { page },
            move |message| Action::FetchSourcesFail {
                page_number,
                message,
            },
        )
        .await
    }

    /// Fetch the groups the user belongs to
    pub async fn fetch_groups(&self) -> SyncResult<FetchOutcome> {
        let correlation = Uuid::now_v7();
        self.pending(Action::FetchGroups, correlation).await?;
        let result = api::fetch_groups(&*self.api).await;
        self.settle(
            correlation,
            result,
            |groups| Action::FetchGroupsOk { groups },
            |message| Action::FetchGroupsFail { message },
        )
        .await
    }

    /// Fetch the user profile
    pub async fn fetch_profile(&self) -> SyncResult<FetchOutcome> {
        let correlation = Uuid::now_v7();
        self.pending(Action::FetchProfile, correlation).await?;
        let result = api::fetch_profile(&*self.api).await;
        self.settle(
            correlation,
            result,
            |profile| Action::FetchProfileOk { profile },
            |message| Action::FetchProfileFail { message },
        )
        .await
    }

    /// Fetch an object's photometry; clears that dataset's share selection
    pub async fn fetch_photometry(&self, obj_id: ObjId) -> SyncResult<FetchOutcome> {
        let correlation = Uuid::now_v7();
        self.pending(Action::FetchPhotometry { obj_id: obj_id.clone() }, correlation)
            .await?;
        let result = api::fetch_photometry(&*self.api, &obj_id).await;
        let id = obj_id.clone();
        self.settle(
            correlation,
            result,
            move |photometry| Action::FetchPhotometryOk { obj_id, photometry },
            move |message| Action::FetchPhotometryFail { obj_id: id, message },
        )
        .await
    }

    /// Fetch an object's spectra; clears that dataset's share selection
    pub async fn fetch_spectra(&self, obj_id: ObjId) -> SyncResult<FetchOutcome> {
        let correlation = Uuid::now_v7();
        self.pending(Action::FetchSpectra { obj_id: obj_id.clone() }, correlation)
            .await?;
        let result = api::fetch_spectra(&*self.api, &obj_id).await;
        let id = obj_id.clone();
        self.settle(
            correlation,
            result,
            move |spectra| Action::FetchSpectraOk { obj_id, spectra },
            move |message| Action::FetchSpectraFail { obj_id: id, message },
        )
        .await
    }

    /// Resolve a plot, consulting the derived cache first
    pub async fn fetch_plot(&self, kind: PlotKind, obj_id: ObjId) -> SyncResult<FetchOutcome> {
        let fingerprint = Fingerprint::plot(kind, obj_id.clone());

        self.store.flush().await?;
        let state = self.store.state();
        if state.plots.get(&fingerprint).is_some() {
            debug!(%fingerprint, "Plot served from cache");
            return Ok(FetchOutcome::Cached);
        }
        if state.plots.pending.contains(&fingerprint) {
            return Ok(FetchOutcome::InFlight);
        }

        let correlation = Uuid::now_v7();
        self.pending(
            Action::FetchPlot {
                fingerprint: fingerprint.clone(),
            },
            correlation,
        )
        .await?;
        let result = api::fetch_plot(&*self.api, kind, &obj_id).await;

        if !self.store.state().plots.pending.contains(&fingerprint) {
            return Ok(stale(SyncError::StaleResponse(fingerprint.to_string())));
        }

        let failed = fingerprint.clone();
        self.settle(
            correlation,
            result,
            move |plot| Action::FetchPlotOk { fingerprint, plot },
            move |message| Action::FetchPlotFail {
                fingerprint: failed,
                message,
            },
        )
        .await
    }

    async fn pending(&self, action: Action, correlation: Uuid) -> SyncResult<()> {
        self.store
            .dispatch_and_wait(action.correlated(correlation))
            .await
            .map(|_| ())
    }

    async fn settle<T>(
        &self,
        correlation: Uuid,
        result: SyncResult<T>,
        ok: impl FnOnce(T) -> Action,
        fail: impl FnOnce(String) -> Action,
    ) -> SyncResult<FetchOutcome> {
        match result {
            Ok(value) => {
                self.store
                    .dispatch_and_wait(ok(value).correlated(correlation))
                    .await?;
                Ok(FetchOutcome::Loaded)
            }
            Err(e) => {
                warn!(error = %e, %correlation, "Request failed");
                self.store
                    .dispatch_and_wait(fail(e.user_message()).correlated(correlation))
                    .await?;
                Ok(FetchOutcome::Failed(e))
            }
        }
    }
}

fn stale(error: SyncError) -> FetchOutcome {
    debug!(%error, "Discarding response");
    FetchOutcome::Stale
}
