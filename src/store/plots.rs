// Copyright (c) 2025 - Cowboy AI, Inc.
//! Plot cache branch
//!
//! Wraps the [`BoundedCache`] of rendered plot artifacts together with the
//! request bookkeeping for plots that are not (yet) cached.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::branch::{Branch, PanelStatus};
use crate::action::Action;
use crate::cache::{BoundedCache, Fingerprint};
use crate::model::{ObjId, PlotArtifact, PlotKind};

/// Cached plots plus in-flight and failed requests
#[derive(Debug, Clone, PartialEq)]
pub struct PlotBranch {
    /// Resolved artifacts
    pub cache: BoundedCache<Arc<PlotArtifact>>,
    /// Requests outstanding
    pub pending: BTreeSet<Fingerprint>,
    /// Last failure per fingerprint
    pub errors: BTreeMap<Fingerprint, String>,
}

impl Default for PlotBranch {
    fn default() -> Self {
        Self::with_capacity(crate::cache::DEFAULT_CAPACITY)
    }
}

impl PlotBranch {
    /// Empty branch whose cache holds at most `capacity` plots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
            pending: BTreeSet::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Cached artifact for `fingerprint`
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Arc<PlotArtifact>> {
        self.cache.get(fingerprint)
    }

    /// Panel status of one plot
    pub fn status(&self, fingerprint: &Fingerprint) -> PanelStatus {
        if self.pending.contains(fingerprint) {
            PanelStatus::Loading
        } else if self.errors.contains_key(fingerprint) {
            PanelStatus::LoadFailed
        } else if self.cache.contains(fingerprint) {
            PanelStatus::Loaded
        } else {
            PanelStatus::Loading
        }
    }

    /// Drop cached artifacts of `obj_id` and forget its in-flight requests,
    /// so a plot rendered from the old data is never stored
    fn invalidate(&self, obj_id: &ObjId, kind: Option<PlotKind>) -> Option<Self> {
        let stale = |fingerprint: &Fingerprint| {
            fingerprint.entity() == obj_id
                && kind.map_or(true, |kind| fingerprint.endpoint() == kind.endpoint())
        };
        let mut next = self.clone();
        let removed = match kind {
            Some(kind) => next.cache.invalidate_endpoint(kind.endpoint(), obj_id),
            None => next.cache.invalidate_entity(obj_id),
        };
        let in_flight = next.pending.len();
        next.pending.retain(|fingerprint| !stale(fingerprint));
        (removed > 0 || next.pending.len() < in_flight).then_some(next)
    }
}

impl Branch for PlotBranch {
    const NAME: &'static str = "plots";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::FetchPlot { fingerprint } => {
                let mut next = self.clone();
                next.pending.insert(fingerprint.clone());
                next.errors.remove(fingerprint);
                Some(next)
            }
            // Requests forgotten by an invalidation render data that changed
            Action::FetchPlotOk { fingerprint, .. } | Action::FetchPlotFail { fingerprint, .. }
                if !self.pending.contains(fingerprint) =>
            {
                None
            }
            Action::FetchPlotOk { fingerprint, plot } => {
                let mut next = self.clone();
                next.pending.remove(fingerprint);
                next.errors.remove(fingerprint);
                next.cache.put(fingerprint.clone(), Arc::new(plot.clone()));
                Some(next)
            }
            Action::FetchPlotFail {
                fingerprint,
                message,
            } => {
                let mut next = self.clone();
                next.pending.remove(fingerprint);
                next.errors.insert(fingerprint.clone(), message.clone());
                Some(next)
            }

            // Derived plots go stale with the data they were rendered from
            Action::RefreshSource { obj_id } => self.invalidate(obj_id, None),
            Action::SourceUpdated { source } => self.invalidate(&source.id, None),
            Action::FetchPhotometryOk { obj_id, .. } => {
                self.invalidate(obj_id, Some(PlotKind::Photometry))
            }
            Action::FetchSpectraOk { obj_id, .. } => {
                self.invalidate(obj_id, Some(PlotKind::Spectroscopy))
            }

            _ => None,
        }
    }
}
