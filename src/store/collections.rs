// Copyright (c) 2025 - Cowboy AI, Inc.
//! Per-user branches: accessible groups and the user profile

use std::sync::Arc;

use super::branch::{Branch, Loadable};
use crate::action::Action;
use crate::model::{Group, Profile};

/// Groups visible to the current user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupsBranch {
    /// Loaded groups
    pub groups: Loadable<Arc<Vec<Group>>>,
}

impl Branch for GroupsBranch {
    const NAME: &'static str = "groups";

    fn reduce(&self, action: &Action) -> Option<Self> {
        let groups = match action {
            Action::FetchGroups => self.groups.pending(),
            Action::FetchGroupsOk { groups } => Loadable::loaded(Arc::new(groups.clone())),
            Action::FetchGroupsFail { message } => self.groups.failed(message.clone()),
            _ => return None,
        };
        Some(Self { groups })
    }
}

/// The current user's profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileBranch {
    /// Loaded profile
    pub profile: Loadable<Arc<Profile>>,
}

impl Branch for ProfileBranch {
    const NAME: &'static str = "profile";

    fn reduce(&self, action: &Action) -> Option<Self> {
        let profile = match action {
            Action::FetchProfile => self.profile.pending(),
            Action::FetchProfileOk { profile } => Loadable::loaded(Arc::new(profile.clone())),
            Action::FetchProfileFail { message } => self.profile.failed(message.clone()),
            _ => return None,
        };
        Some(Self { profile })
    }
}
