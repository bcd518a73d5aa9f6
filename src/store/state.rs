// Copyright (c) 2025 - Cowboy AI, Inc.
//! Root state and the root reducer
//!
//! The root reducer fans an action out to every branch. It is a pure fold,
//! so replaying an action log from an initial state always rebuilds the same
//! snapshot:
//!
//! ```rust
//! use survey_sync::action::Action;
//! use survey_sync::store::AppState;
//!
//! let actions = vec![Action::FetchGroups, Action::FetchProfile];
//! let a = AppState::replay(AppState::default(), actions.clone());
//! let b = AppState::replay(AppState::default(), actions);
//! assert_eq!(a, b);
//! ```

use std::sync::Arc;

use super::branch::apply;
use super::collections::{GroupsBranch, ProfileBranch};
use super::datasets::{PhotometryBranch, SpectraBranch};
use super::plots::PlotBranch;
use super::sharing::SharingBranch;
use super::source::{CurrentSourceBranch, SourceListBranch};
use super::status::{ConnectionBranch, NotificationsBranch};
use crate::action::Action;

/// An immutable snapshot of every branch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// `currentSource`
    pub current_source: Arc<CurrentSourceBranch>,
    /// `sourceList`
    pub source_list: Arc<SourceListBranch>,
    /// `groups`
    pub groups: Arc<GroupsBranch>,
    /// `profile`
    pub profile: Arc<ProfileBranch>,
    /// `photometry`, keyed by object
    pub photometry: Arc<PhotometryBranch>,
    /// `spectra`, keyed by object
    pub spectra: Arc<SpectraBranch>,
    /// `plots`
    pub plots: Arc<PlotBranch>,
    /// `sharing`
    pub sharing: Arc<SharingBranch>,
    /// `connection`
    pub connection: Arc<ConnectionBranch>,
    /// `notifications`
    pub notifications: Arc<NotificationsBranch>,
}

impl AppState {
    /// Default state with a plot cache of the given capacity
    pub fn with_plot_capacity(capacity: usize) -> Self {
        Self {
            plots: Arc::new(PlotBranch::with_capacity(capacity)),
            ..Self::default()
        }
    }

    /// Apply one action to every branch
    pub fn reduce(&self, action: &Action) -> AppState {
        AppState {
            current_source: apply(&self.current_source, action),
            source_list: apply(&self.source_list, action),
            groups: apply(&self.groups, action),
            profile: apply(&self.profile, action),
            photometry: apply(&self.photometry, action),
            spectra: apply(&self.spectra, action),
            plots: apply(&self.plots, action),
            sharing: apply(&self.sharing, action),
            connection: apply(&self.connection, action),
            notifications: apply(&self.notifications, action),
        }
    }

    /// Fold a sequence of actions through the root reducer
    pub fn replay<I>(initial: AppState, actions: I) -> AppState
    where
        I: IntoIterator<Item = Action>,
    {
        actions
            .into_iter()
            .fold(initial, |state, action| state.reduce(&action))
    }

    /// Names of the branches whose identity differs from `previous`
    pub fn changed_branches(&self, previous: &AppState) -> Vec<&'static str> {
        use super::branch::Branch;

        let mut changed = Vec::new();
        macro_rules! diff {
            ($($field:ident: $ty:ty),* $(,)?) => {
                $(
                    if !Arc::ptr_eq(&self.$field, &previous.$field) {
                        changed.push(<$ty as Branch>::NAME);
                    }
                )*
            };
        }
        diff!(
            current_source: CurrentSourceBranch,
            source_list: SourceListBranch,
            groups: GroupsBranch,
            profile: ProfileBranch,
            photometry: PhotometryBranch,
            spectra: SpectraBranch,
            plots: PlotBranch,
            sharing: SharingBranch,
            connection: ConnectionBranch,
            notifications: NotificationsBranch,
        );
        changed
    }
}
