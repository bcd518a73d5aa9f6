// Copyright (c) 2025 - Cowboy AI, Inc.
//! Actions: immutable descriptions of state changes
//!
//! Actions are produced by three sources only: the connection manager
//! (routed push frames and connection status), completed requests (the
//! `_OK` / `_FAIL` pair emitted by a thunk), and synchronous local events
//! (selection toggles, notification dismissal).
//!
//! Actions serialize in the wire shape the server uses for pushed actions:
//!
//! ```text
//! { "kind": "skyportal/FETCH_SOURCE_OK", "payload": { ... } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::Fingerprint;
use crate::model::{
    Comment, Dataset, Group, GroupId, NotificationLevel, ObjId, Photometry, PlotArtifact, Profile,
    Source, SourcePage, Spectrum,
};
use crate::sharing::ShareRequest;
use crate::state_machine::ConnectionState;

/// Every state change the store understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Action {
    // Current source
    /// A source fetch was issued
    #[serde(rename = "skyportal/FETCH_SOURCE")]
    FetchSource { obj_id: ObjId },
    /// A source fetch completed
    #[serde(rename = "skyportal/FETCH_SOURCE_OK")]
    FetchSourceOk { obj_id: ObjId, source: Source },
    /// A source fetch failed
    #[serde(rename = "skyportal/FETCH_SOURCE_FAIL")]
    FetchSourceFail { obj_id: ObjId, message: String },
    /// Server announced that a source changed and should be re-read
    #[serde(rename = "skyportal/REFRESH_SOURCE")]
    RefreshSource { obj_id: ObjId },
    /// Server pushed a full source document
    #[serde(rename = "skyportal/SOURCE_UPDATED")]
    SourceUpdated { source: Source },
    /// Server pushed a new comment
    #[serde(rename = "skyportal/COMMENT_ADDED")]
    CommentAdded { obj_id: ObjId, comment: Comment },

    // Source list
    /// A source list page was requested
    #[serde(rename = "skyportal/FETCH_SOURCES")]
    FetchSources { page_number: u32 },
    /// A source list page arrived
    #[serde(rename = "skyportal/FETCH_SOURCES_OK")]
    FetchSourcesOk { page: SourcePage },
    /// A source list page failed
    #[serde(rename = "skyportal/FETCH_SOURCES_FAIL")]
    FetchSourcesFail { page_number: u32, message: String },

    // Groups
    /// Groups were requested
    #[serde(rename = "skyportal/FETCH_GROUPS")]
    FetchGroups,
    /// Groups arrived
    #[serde(rename = "skyportal/FETCH_GROUPS_OK")]
    FetchGroupsOk { groups: Vec<Group> },
    /// Groups failed
    #[serde(rename = "skyportal/FETCH_GROUPS_FAIL")]
    FetchGroupsFail { message: String },
    /// Server announced a group change
    #[serde(rename = "skyportal/REFRESH_GROUP")]
    RefreshGroup { group_id: GroupId },

    // Profile
    /// Profile was requested
    #[serde(rename = "skyportal/FETCH_USER_PROFILE")]
    FetchProfile,
    /// Profile arrived
    #[serde(rename = "skyportal/FETCH_USER_PROFILE_OK")]
    FetchProfileOk { profile: Profile },
    /// Profile failed
    #[serde(rename = "skyportal/FETCH_USER_PROFILE_FAIL")]
    FetchProfileFail { message: String },
    /// Server announced a profile change
    #[serde(rename = "skyportal/REFRESH_PROFILE")]
    RefreshProfile,

    // Photometry
    /// Photometry for an object was requested
    #[serde(rename = "skyportal/FETCH_SOURCE_PHOTOMETRY")]
    FetchPhotometry { obj_id: ObjId },
    /// Photometry arrived
    #[serde(rename = "skyportal/FETCH_SOURCE_PHOTOMETRY_OK")]
    FetchPhotometryOk { obj_id: ObjId, photometry: Vec<Photometry> },
    /// Photometry failed
    #[serde(rename = "skyportal/FETCH_SOURCE_PHOTOMETRY_FAIL")]
    FetchPhotometryFail { obj_id: ObjId, message: String },

    // Spectra
    /// Spectra for an object were requested
    #[serde(rename = "skyportal/FETCH_SOURCE_SPECTRA")]
    FetchSpectra { obj_id: ObjId },
    /// Spectra arrived
    #[serde(rename = "skyportal/FETCH_SOURCE_SPECTRA_OK")]
    FetchSpectraOk { obj_id: ObjId, spectra: Vec<Spectrum> },
    /// Spectra failed
    #[serde(rename = "skyportal/FETCH_SOURCE_SPECTRA_FAIL")]
    FetchSpectraFail { obj_id: ObjId, message: String },

    // Plots
    /// A plot was requested
    #[serde(rename = "skyportal/FETCH_PLOT")]
    FetchPlot { fingerprint: Fingerprint },
    /// A plot artifact was resolved
    #[serde(rename = "skyportal/FETCH_PLOT_OK")]
    FetchPlotOk { fingerprint: Fingerprint, plot: PlotArtifact },
    /// A plot request failed
    #[serde(rename = "skyportal/FETCH_PLOT_FAIL")]
    FetchPlotFail { fingerprint: Fingerprint, message: String },

    // Sharing
    /// A dataset row was toggled in the share selection
    #[serde(rename = "skyportal/TOGGLE_SHARE_SELECTION")]
    ToggleShareSelection { obj_id: ObjId, dataset: Dataset, row: usize },
    /// Both share selections were cleared by the user
    #[serde(rename = "skyportal/CLEAR_SHARE_SELECTION")]
    ClearShareSelection,
    /// A sharing request was submitted
    #[serde(rename = "skyportal/SHARE_DATA")]
    ShareData { request: ShareRequest },
    /// The sharing request succeeded
    #[serde(rename = "skyportal/SHARE_DATA_OK")]
    ShareDataOk { message: Option<String> },
    /// The sharing request failed
    #[serde(rename = "skyportal/SHARE_DATA_FAIL")]
    ShareDataFail { message: String },

    // Connection
    /// The connection manager changed state
    #[serde(rename = "baselayer/CONNECTION_STATE")]
    ConnectionChanged {
        state: ConnectionState,
        attempts: u32,
        error: Option<String>,
    },

    // Notifications
    /// Show a server notification
    #[serde(rename = "baselayer/SHOW_NOTIFICATION")]
    ShowNotification { note: String, level: NotificationLevel },
    /// Dismiss a notification by id
    #[serde(rename = "baselayer/DISMISS_NOTIFICATION")]
    DismissNotification { id: u64 },
}

impl Action {
    /// The wire tag of this action
    pub fn kind(&self) -> &'static str {
        match self {
            Action::FetchSource { .. } => "skyportal/FETCH_SOURCE",
            Action::FetchSourceOk { .. } => "skyportal/FETCH_SOURCE_OK",
            Action::FetchSourceFail { .. } => "skyportal/FETCH_SOURCE_FAIL",
            Action::RefreshSource { .. } => "skyportal/REFRESH_SOURCE",
            Action::SourceUpdated { .. } => "skyportal/SOURCE_UPDATED",
            Action::CommentAdded { .. } => "skyportal/COMMENT_ADDED",
            Action::FetchSources { .. } => "skyportal/FETCH_SOURCES",
            Action::FetchSourcesOk { .. } => "skyportal/FETCH_SOURCES_OK",
            Action::FetchSourcesFail { .. } => "skyportal/FETCH_SOURCES_FAIL",
            Action::FetchGroups => "skyportal/FETCH_GROUPS",
            Action::FetchGroupsOk { .. } => "skyportal/FETCH_GROUPS_OK",
            Action::FetchGroupsFail { .. } => "skyportal/FETCH_GROUPS_FAIL",
            Action::RefreshGroup { .. } => "skyportal/REFRESH_GROUP",
            Action::FetchProfile => "skyportal/FETCH_USER_PROFILE",
            Action::FetchProfileOk { .. } => "skyportal/FETCH_USER_PROFILE_OK",
            Action::FetchProfileFail { .. } => "skyportal/FETCH_USER_PROFILE_FAIL",
            Action::RefreshProfile => "skyportal/REFRESH_PROFILE",
            Action::FetchPhotometry { .. } => "skyportal/FETCH_SOURCE_PHOTOMETRY",
            Action::FetchPhotometryOk { .. } => "skyportal/FETCH_SOURCE_PHOTOMETRY_OK",
            Action::FetchPhotometryFail { .. } => "skyportal/FETCH_SOURCE_PHOTOMETRY_FAIL",
            Action::FetchSpectra { .. } => "skyportal/FETCH_SOURCE_SPECTRA",
            Action::FetchSpectraOk { .. } => "skyportal/FETCH_SOURCE_SPECTRA_OK",
            Action::FetchSpectraFail { .. } => "skyportal/FETCH_SOURCE_SPECTRA_FAIL",
            Action::FetchPlot { .. } => "skyportal/FETCH_PLOT",
            Action::FetchPlotOk { .. } => "skyportal/FETCH_PLOT_OK",
            Action::FetchPlotFail { .. } => "skyportal/FETCH_PLOT_FAIL",
            Action::ToggleShareSelection { .. } => "skyportal/TOGGLE_SHARE_SELECTION",
            Action::ClearShareSelection => "skyportal/CLEAR_SHARE_SELECTION",
            Action::ShareData { .. } => "skyportal/SHARE_DATA",
            Action::ShareDataOk { .. } => "skyportal/SHARE_DATA_OK",
            Action::ShareDataFail { .. } => "skyportal/SHARE_DATA_FAIL",
            Action::ConnectionChanged { .. } => "baselayer/CONNECTION_STATE",
            Action::ShowNotification { .. } => "baselayer/SHOW_NOTIFICATION",
            Action::DismissNotification { .. } => "baselayer/DISMISS_NOTIFICATION",
        }
    }

    /// Attach a correlation id, producing a dispatchable envelope
    pub fn correlated(self, correlation_id: Uuid) -> ActionEnvelope {
        ActionEnvelope {
            action: self,
            correlation_id: Some(correlation_id),
            dispatched_at: Utc::now(),
        }
    }
}

/// An action plus dispatch metadata
///
/// Reducers only ever see the inner [`Action`]; the metadata exists for
/// tracing request/response pairs through the logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// The action itself
    pub action: Action,
    /// Links a pending action to its terminal `_OK` / `_FAIL` action
    pub correlation_id: Option<Uuid>,
    /// When the action was handed to the store
    pub dispatched_at: DateTime<Utc>,
}

impl From<Action> for ActionEnvelope {
    fn from(action: Action) -> Self {
        Self {
            action,
            correlation_id: None,
            dispatched_at: Utc::now(),
        }
    }
}
