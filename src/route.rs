// Copyright (c) 2025 - Cowboy AI, Inc.
//! Route-Cache Coherency Check
//!
//! Decides, on every navigation or mount, whether the source the route asks
//! for is already in the store. Identity is always compared by identifier,
//! never by the fetched object.
//!
//! ```text
//! requested == in-flight request  ──> Loading
//! requested == displayed, no error ──> Cached
//! anything else                    ──> NeedsFetch
//! ```
//!
//! [`check_source_route`] is a pure function and can be evaluated as often as
//! a view likes. [`RouteGuard`] layers the "fire once" rule on top: a fetch is
//! issued at most once per navigation epoch, so re-evaluating during a single
//! navigation never re-triggers a request.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::ObjId;
use crate::store::source::CurrentSourceBranch;
use crate::store::PanelStatus;

/// Outcome of the coherency check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coherency {
    /// The displayed source is missing, different, or failed to load
    NeedsFetch,
    /// The displayed source is the requested one
    Cached,
    /// A fetch for the requested source is in flight
    Loading,
}

impl Coherency {
    /// Panel status implied by this outcome and the branch's error flag
    ///
    /// Always one of loading, loaded, or load-failed.
    pub fn panel_status(self, branch: &CurrentSourceBranch, requested: &ObjId) -> PanelStatus {
        match self {
            Coherency::Cached => PanelStatus::Loaded,
            Coherency::Loading => PanelStatus::Loading,
            Coherency::NeedsFetch if has_error_for(branch, requested) => PanelStatus::LoadFailed,
            Coherency::NeedsFetch => PanelStatus::Loading,
        }
    }
}

fn has_error_for(branch: &CurrentSourceBranch, requested: &ObjId) -> bool {
    branch.load_error.is_some() && branch.requested.as_ref() == Some(requested)
}

/// Compare the route's requested identifier against the current-source branch
pub fn check_source_route(branch: &CurrentSourceBranch, requested: &ObjId) -> Coherency {
    if branch.loading && branch.requested.as_ref() == Some(requested) {
        return Coherency::Loading;
    }
    if branch.displayed_id() == Some(requested) && !has_error_for(branch, requested) {
        return Coherency::Cached;
    }
    Coherency::NeedsFetch
}

/// Fires the route's fetch at most once per navigation
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    target: Option<ObjId>,
    epoch: u64,
    fired_epoch: Option<u64>,
}

impl RouteGuard {
    /// Create a guard with no active route
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the route currently asks for
    pub fn target(&self) -> Option<&ObjId> {
        self.target.as_ref()
    }

    /// Current navigation epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Point the route at `obj_id`
    ///
    /// Returns `true` when this starts a new navigation. Navigating to the
    /// identifier already targeted is not a new navigation.
    pub fn navigate(&mut self, obj_id: ObjId) -> bool {
        if self.target.as_ref() == Some(&obj_id) {
            return false;
        }
        self.target = Some(obj_id);
        self.epoch += 1;
        true
    }

    /// Allow one more fetch for the current target (user-requested retry)
    pub fn retry(&mut self) {
        self.epoch += 1;
    }

    /// Coherency of the current target, if any
    pub fn coherency(&self, branch: &CurrentSourceBranch) -> Option<Coherency> {
        self.target
            .as_ref()
            .map(|target| check_source_route(branch, target))
    }

    /// Evaluate the check and claim the epoch's fetch if one is needed
    ///
    /// Returns the identifier to fetch, or `None` when the store is coherent,
    /// a fetch is in flight, or this epoch already fired.
    pub fn evaluate(&mut self, branch: &CurrentSourceBranch) -> Option<ObjId> {
        let target = self.target.as_ref()?;
        let coherency = check_source_route(branch, target);

        if coherency != Coherency::NeedsFetch {
            return None;
        }
        if self.fired_epoch == Some(self.epoch) {
            debug!(obj_id = %target, epoch = self.epoch, "Fetch already issued for this navigation");
            return None;
        }

        self.fired_epoch = Some(self.epoch);
        Some(target.clone())
    }
}
