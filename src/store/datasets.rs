// Copyright (c) 2025 - Cowboy AI, Inc.
//! Per-object datasets: photometry and spectra keyed by object identifier
//!
//! Only the source the route targets keeps its datasets. Navigating to
//! another source drops every other object's rows.

use std::collections::HashMap;
use std::sync::Arc;

use super::branch::{Branch, Loadable, PanelStatus};
use crate::action::Action;
use crate::model::{ObjId, Photometry, Spectrum};

/// A dataset per object
#[derive(Debug, Clone, PartialEq)]
pub struct ByObject<T> {
    by_object: HashMap<ObjId, Loadable<Arc<Vec<T>>>>,
}

impl<T> Default for ByObject<T> {
    fn default() -> Self {
        Self {
            by_object: HashMap::new(),
        }
    }
}

impl<T: Clone> ByObject<T> {
    /// The dataset of one object
    pub fn get(&self, obj_id: &ObjId) -> Option<&Loadable<Arc<Vec<T>>>> {
        self.by_object.get(obj_id)
    }

    /// Rows of one object, in the order the server returned them
    pub fn rows(&self, obj_id: &ObjId) -> Option<&Arc<Vec<T>>> {
        self.get(obj_id).and_then(|loadable| loadable.data.as_ref())
    }

    /// Panel status of one object's dataset
    pub fn status(&self, obj_id: &ObjId) -> PanelStatus {
        self.get(obj_id)
            .map(Loadable::status)
            .unwrap_or(PanelStatus::Loading)
    }

    /// Whether rows for `obj_id` are already present
    pub fn has_rows(&self, obj_id: &ObjId) -> bool {
        self.rows(obj_id).is_some()
    }

    fn with(&self, obj_id: &ObjId, loadable: Loadable<Arc<Vec<T>>>) -> Self {
        let mut by_object = self.by_object.clone();
        by_object.insert(obj_id.clone(), loadable);
        Self { by_object }
    }

    fn current(&self, obj_id: &ObjId) -> Loadable<Arc<Vec<T>>> {
        self.by_object.get(obj_id).cloned().unwrap_or_default()
    }

    fn pending(&self, obj_id: &ObjId) -> Self {
        self.with(obj_id, self.current(obj_id).pending())
    }

    fn loaded(&self, obj_id: &ObjId, rows: &[T]) -> Self {
        self.with(obj_id, Loadable::loaded(Arc::new(rows.to_vec())))
    }

    fn failed(&self, obj_id: &ObjId, message: &str) -> Self {
        self.with(obj_id, self.current(obj_id).failed(message))
    }

    fn retain_only(&self, obj_id: &ObjId) -> Option<Self> {
        if self.by_object.keys().all(|key| key == obj_id) {
            return None;
        }
        let by_object = self
            .by_object
            .iter()
            .filter(|(key, _)| *key == obj_id)
            .map(|(key, loadable)| (key.clone(), loadable.clone()))
            .collect();
        Some(Self { by_object })
    }

    /// Number of objects with a dataset entry
    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    /// Whether no object has a dataset entry
    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }
}

/// Photometry by object
pub type PhotometryBranch = ByObject<Photometry>;

/// Spectra by object
pub type SpectraBranch = ByObject<Spectrum>;

impl Branch for ByObject<Photometry> {
    const NAME: &'static str = "photometry";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::FetchSource { obj_id } => self.retain_only(obj_id),
            Action::FetchPhotometry { obj_id } => Some(self.pending(obj_id)),
            Action::FetchPhotometryOk { obj_id, photometry } => {
                Some(self.loaded(obj_id, photometry))
            }
            Action::FetchPhotometryFail { obj_id, message } => Some(self.failed(obj_id, message)),
            _ => None,
        }
    }
}

impl Branch for ByObject<Spectrum> {
    const NAME: &'static str = "spectra";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::FetchSource { obj_id } => self.retain_only(obj_id),
            Action::FetchSpectra { obj_id } => Some(self.pending(obj_id)),
            Action::FetchSpectraOk { obj_id, spectra } => Some(self.loaded(obj_id, spectra)),
            Action::FetchSpectraFail { obj_id, message } => Some(self.failed(obj_id, message)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PhotometryId;

    fn point(id: i64, obj: &str) -> Photometry {
        Photometry {
            id: PhotometryId(id),
            obj_id: ObjId::new(obj),
            mjd: 59000.0 + id as f64,
            mag: Some(18.2),
            magerr: Some(0.05),
            filter: "ztfg".into(),
            instrument_id: 1,
        }
    }

    #[test]
    fn test_objects_are_independent() {
        let a = ObjId::new("A");
        let b = ObjId::new("B");

        let branch = PhotometryBranch::default()
            .reduce(&Action::FetchPhotometryOk {
                obj_id: a.clone(),
                photometry: vec![point(1, "A"), point(2, "A")],
            })
            .unwrap()
            .reduce(&Action::FetchPhotometryFail {
                obj_id: b.clone(),
                message: "timeout".into(),
            })
            .unwrap();

        assert_eq!(branch.status(&a), PanelStatus::Loaded);
        assert_eq!(branch.rows(&a).unwrap().len(), 2);
        assert_eq!(branch.status(&b), PanelStatus::LoadFailed);
        assert_eq!(branch.status(&ObjId::new("C")), PanelStatus::Loading);
    }

    #[test]
    fn test_refetch_keeps_rows_while_pending() {
        let a = ObjId::new("A");
        let branch = PhotometryBranch::default()
            .reduce(&Action::FetchPhotometryOk {
                obj_id: a.clone(),
                photometry: vec![point(1, "A")],
            })
            .unwrap()
            .reduce(&Action::FetchPhotometry { obj_id: a.clone() })
            .unwrap();

        assert_eq!(branch.status(&a), PanelStatus::Loading);
        assert!(branch.has_rows(&a));
    }

    #[test]
    fn test_navigation_prunes_other_objects() {
        let a = ObjId::new("A");
        let b = ObjId::new("B");
        let branch = PhotometryBranch::default()
            .reduce(&Action::FetchPhotometryOk {
                obj_id: a.clone(),
                photometry: vec![point(1, "A")],
            })
            .unwrap()
            .reduce(&Action::FetchPhotometryOk {
                obj_id: b.clone(),
                photometry: vec![point(2, "B")],
            })
            .unwrap();
        assert_eq!(branch.len(), 2);

        let pruned = branch
            .reduce(&Action::FetchSource { obj_id: b.clone() })
            .unwrap();
        assert_eq!(pruned.len(), 1);
        assert!(pruned.has_rows(&b));
        assert!(!pruned.has_rows(&a));

        // Re-fetching the same source changes nothing
        assert!(pruned.reduce(&Action::FetchSource { obj_id: b }).is_none());
    }

    #[test]
    fn test_spectra_ignore_photometry_actions() {
        let branch = SpectraBranch::default();
        assert!(branch
            .reduce(&Action::FetchPhotometry {
                obj_id: ObjId::new("A")
            })
            .is_none());
    }
}
