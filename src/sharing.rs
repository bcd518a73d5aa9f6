// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data-Sharing Transaction Coordinator
//!
//! Selections are kept as dataset *row indices* in the store's sharing
//! branch. They are resolved to stable photometry/spectrum identifiers only
//! when [`SharingCoordinator::submit`] runs, against the rows present at that
//! moment. A re-fetch of either dataset clears its selection both when it
//! starts and when its rows arrive, so an index never silently re-targets a
//! different record.
//!
//! Submission is one atomic request:
//!
//! ```text
//! POST /api/sharing { groupIds, photometryIds, spectrumIds }
//! ```
//!
//! Success clears both selection sets; failure keeps them for a retry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::api::{self, ApiClient};
use crate::errors::{SyncError, SyncResult};
use crate::model::{Dataset, GroupId, ObjId, PhotometryId, SpectrumId};
use crate::store::{AppState, Store};

/// Body of a sharing submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Groups receiving access
    pub group_ids: Vec<GroupId>,
    /// Photometry points being shared
    pub photometry_ids: Vec<PhotometryId>,
    /// Spectra being shared
    pub spectrum_ids: Vec<SpectrumId>,
}

impl ShareRequest {
    /// Number of data identifiers in the request
    pub fn data_len(&self) -> usize {
        self.photometry_ids.len() + self.spectrum_ids.len()
    }
}

/// Selection and submission of data shares
#[derive(Clone)]
pub struct SharingCoordinator {
    store: Store,
    api: Arc<dyn ApiClient>,
}

impl SharingCoordinator {
    /// Coordinator writing selections into `store` and submitting through `api`
    pub fn new(store: Store, api: Arc<dyn ApiClient>) -> Self {
        Self { store, api }
    }

    /// Toggle a row of the displayed source's dataset
    pub fn toggle_selection(&self, dataset: Dataset, row: usize) -> SyncResult<()> {
        let state = self.store.state();
        let obj_id = state
            .current_source
            .displayed_id()
            .cloned()
            .ok_or_else(|| SyncError::Validation("no source is displayed".into()))?;
        self.toggle_for(obj_id, dataset, row)
    }

    /// Toggle a row of `obj_id`'s dataset
    ///
    /// Selecting for a different object than the current selection starts a
    /// fresh selection.
    pub fn toggle_for(&self, obj_id: ObjId, dataset: Dataset, row: usize) -> SyncResult<()> {
        self.store.dispatch(Action::ToggleShareSelection {
            obj_id,
            dataset,
            row,
        })
    }

    /// Drop both selection sets
    pub fn clear(&self) -> SyncResult<()> {
        self.store.dispatch(Action::ClearShareSelection)
    }

    /// Share the selected rows with `group_ids`
    ///
    /// Fails with [`SyncError::Validation`] and no request when the group
    /// list is empty, nothing is selected, a submission is already running,
    /// or a selected row no longer exists. Returns the server's message.
    pub async fn submit(&self, group_ids: Vec<GroupId>) -> SyncResult<Option<String>> {
        if group_ids.is_empty() {
            return Err(SyncError::Validation(
                "at least one target group is required".into(),
            ));
        }

        // Pending toggles must be applied before rows are resolved
        self.store.flush().await?;
        let request = resolve(&self.store.state(), group_ids)?;

        let correlation = Uuid::now_v7();
        self.store
            .dispatch_and_wait(
                Action::ShareData {
                    request: request.clone(),
                }
                .correlated(correlation),
            )
            .await?;

        match api::share_data(&*self.api, &request).await {
            Ok(message) => {
                info!(
                    groups = request.group_ids.len(),
                    items = request.data_len(),
                    "Shared data"
                );
                self.store
                    .dispatch_and_wait(
                        Action::ShareDataOk {
                            message: message.clone(),
                        }
                        .correlated(correlation),
                    )
                    .await?;
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "Sharing request failed");
                self.store
                    .dispatch_and_wait(
                        Action::ShareDataFail {
                            message: e.user_message(),
                        }
                        .correlated(correlation),
                    )
                    .await?;
                Err(e)
            }
        }
    }
}

/// Resolve the selected row indices to identifiers
fn resolve(state: &AppState, group_ids: Vec<GroupId>) -> SyncResult<ShareRequest> {
    let sharing = &state.sharing;
    if sharing.submitting {
        return Err(SyncError::Validation(
            "a sharing request is already in flight".into(),
        ));
    }
    let obj_id = match &sharing.obj_id {
        Some(obj_id) if !sharing.is_empty() => obj_id,
        _ => return Err(SyncError::Validation("no data selected".into())),
    };

    let photometry_ids = pick(
        &sharing.photometry,
        state.photometry.rows(obj_id).map(|rows| rows.as_slice()),
        Dataset::Photometry,
        |point| point.id,
    )?;
    let spectrum_ids = pick(
        &sharing.spectra,
        state.spectra.rows(obj_id).map(|rows| rows.as_slice()),
        Dataset::Spectra,
        |spectrum| spectrum.id,
    )?;

    Ok(ShareRequest {
        group_ids,
        photometry_ids,
        spectrum_ids,
    })
}

fn pick<T, I>(
    selected: &BTreeSet<usize>,
    rows: Option<&[T]>,
    dataset: Dataset,
    id: impl Fn(&T) -> I,
) -> SyncResult<Vec<I>> {
    let rows = rows.unwrap_or_default();
    selected
        .iter()
        .map(|&row| {
            rows.get(row).map(&id).ok_or_else(|| {
                SyncError::Validation(format!("{dataset:?} row {row} no longer exists"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = ShareRequest {
            group_ids: vec![GroupId(3)],
            photometry_ids: vec![PhotometryId(10), PhotometryId(11)],
            spectrum_ids: vec![SpectrumId(7)],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "groupIds": [3], "photometryIds": [10, 11], "spectrumIds": [7] })
        );
        assert_eq!(request.data_len(), 3);
    }

    #[test]
    fn test_nothing_selected_is_validation_error() {
        let result = resolve(&AppState::default(), vec![GroupId(1)]);
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[test]
    fn test_out_of_range_row_is_validation_error() {
        let state = AppState::default().reduce(&Action::ToggleShareSelection {
            obj_id: ObjId::new("A"),
            dataset: Dataset::Spectra,
            row: 4,
        });
        let result = resolve(&state, vec![GroupId(1)]);
        assert_eq!(
            result,
            Err(SyncError::Validation("Spectra row 4 no longer exists".into()))
        );
    }
}
