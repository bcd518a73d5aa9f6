// Copyright (c) 2025 - Cowboy AI, Inc.
//! Share selection branch
//!
//! Holds two independent sets of dataset row indices (photometry, spectra)
//! scoped to one source. Row indices are only meaningful against the dataset
//! they were taken from, so the set for a dataset is cleared when a re-fetch
//! of that dataset starts and again when its new rows land. Rows stay on
//! screen while the re-fetch is pending, so a toggle in between would
//! otherwise be resolved against rows the user never saw.

use std::collections::BTreeSet;

use super::branch::Branch;
use crate::action::Action;
use crate::model::{Dataset, ObjId};

/// Selected rows and submission status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharingBranch {
    /// Object the selections belong to
    pub obj_id: Option<ObjId>,
    /// Selected photometry row indices
    pub photometry: BTreeSet<usize>,
    /// Selected spectrum row indices
    pub spectra: BTreeSet<usize>,
    /// A submission is in flight
    pub submitting: bool,
    /// Failure of the last submission
    pub last_error: Option<String>,
    /// Server message from the last successful submission
    pub last_message: Option<String>,
}

impl SharingBranch {
    /// Selected rows of one dataset
    pub fn selected(&self, dataset: Dataset) -> &BTreeSet<usize> {
        match dataset {
            Dataset::Photometry => &self.photometry,
            Dataset::Spectra => &self.spectra,
        }
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.photometry.is_empty() && self.spectra.is_empty()
    }

    fn scoped_to(&self, obj_id: &ObjId) -> bool {
        self.obj_id.as_ref() == Some(obj_id)
    }

    fn toggle(&self, obj_id: &ObjId, dataset: Dataset, row: usize) -> Self {
        let mut next = if self.scoped_to(obj_id) {
            self.clone()
        } else {
            Self {
                obj_id: Some(obj_id.clone()),
                ..Self::default()
            }
        };
        let set = match dataset {
            Dataset::Photometry => &mut next.photometry,
            Dataset::Spectra => &mut next.spectra,
        };
        if !set.remove(&row) {
            set.insert(row);
        }
        next
    }

    fn invalidate(&self, obj_id: &ObjId, dataset: Dataset) -> Option<Self> {
        if !self.scoped_to(obj_id) || self.selected(dataset).is_empty() {
            return None;
        }
        let mut next = self.clone();
        match dataset {
            Dataset::Photometry => next.photometry.clear(),
            Dataset::Spectra => next.spectra.clear(),
        }
        Some(next)
    }
}

impl Branch for SharingBranch {
    const NAME: &'static str = "sharing";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::ToggleShareSelection {
                obj_id,
                dataset,
                row,
            } => Some(self.toggle(obj_id, *dataset, *row)),

            Action::ClearShareSelection => Some(Self {
                obj_id: self.obj_id.clone(),
                ..Self::default()
            }),

            Action::FetchPhotometry { obj_id } => self.invalidate(obj_id, Dataset::Photometry),
            Action::FetchSpectra { obj_id } => self.invalidate(obj_id, Dataset::Spectra),
            Action::FetchPhotometryOk { obj_id, .. } => {
                self.invalidate(obj_id, Dataset::Photometry)
            }
            Action::FetchSpectraOk { obj_id, .. } => self.invalidate(obj_id, Dataset::Spectra),

            Action::ShareData { .. } => Some(Self {
                submitting: true,
                last_error: None,
                last_message: None,
                ..self.clone()
            }),
            Action::ShareDataOk { message } => Some(Self {
                obj_id: self.obj_id.clone(),
                last_message: message.clone(),
                ..Self::default()
            }),
            Action::ShareDataFail { message } => Some(Self {
                submitting: false,
                last_error: Some(message.clone()),
                ..self.clone()
            }),

            _ => None,
        }
    }
}
