// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Store Replay
//!
//! The root reducer is a pure fold. These properties check that replaying
//! an action log is deterministic, that a log can be replayed in pieces,
//! and that no action sequence regresses the displayed source to older
//! data.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::Map;
use survey_sync::action::Action;
use survey_sync::model::{Comment, Dataset, NotificationLevel, ObjId, Photometry, PhotometryId, Source};
use survey_sync::store::status::MAX_NOTIFICATIONS;
use survey_sync::store::AppState;

// ============================================================================
// Strategies
// ============================================================================

fn obj_id() -> impl Strategy<Value = ObjId> {
    prop_oneof![Just(ObjId::new("A")), Just(ObjId::new("B")), Just(ObjId::new("C"))]
}

fn modified() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop::option::weighted(0.8, (0i64..1_000).prop_map(|minutes| {
        Utc.timestamp_opt(1_768_824_000 + minutes * 60, 0).single()
    }))
    .prop_map(Option::flatten)
}

fn source() -> impl Strategy<Value = Source> {
    (obj_id(), modified(), prop::option::of(0.0f64..2.0)).prop_map(|(id, modified, redshift)| {
        Source {
            id,
            ra: 10.0,
            dec: -5.0,
            redshift,
            modified,
            comments: Vec::new(),
            groups: Vec::new(),
            extra: Map::new(),
        }
    })
}

fn comment() -> impl Strategy<Value = Comment> {
    (0i64..5).prop_map(|id| Comment {
        id,
        text: format!("comment {id}"),
        author: "observer".into(),
        created_at: Utc.timestamp_opt(1_768_824_000, 0).unwrap(),
    })
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        obj_id().prop_map(|obj_id| Action::FetchSource { obj_id }),
        (obj_id(), source()).prop_map(|(obj_id, mut source)| {
            source.id = obj_id.clone();
            Action::FetchSourceOk { obj_id, source }
        }),
        obj_id().prop_map(|obj_id| Action::FetchSourceFail {
            obj_id,
            message: "not found".into(),
        }),
        source().prop_map(|source| Action::SourceUpdated { source }),
        (obj_id(), comment()).prop_map(|(obj_id, comment)| Action::CommentAdded { obj_id, comment }),
        obj_id().prop_map(|obj_id| Action::FetchPhotometry { obj_id }),
        (obj_id(), 0usize..4).prop_map(|(obj_id, rows)| Action::FetchPhotometryOk {
            photometry: (0..rows)
                .map(|n| Photometry {
                    id: PhotometryId(n as i64),
                    obj_id: obj_id.clone(),
                    mjd: 59_000.0,
                    mag: None,
                    magerr: None,
                    filter: "ztfg".into(),
                    instrument_id: 1,
                })
                .collect(),
            obj_id,
        }),
        (obj_id(), prop_oneof![Just(Dataset::Photometry), Just(Dataset::Spectra)], 0usize..4)
            .prop_map(|(obj_id, dataset, row)| Action::ToggleShareSelection { obj_id, dataset, row }),
        Just(Action::ClearShareSelection),
        "[a-z]{1,8}".prop_map(|note| Action::ShowNotification {
            note,
            level: NotificationLevel::Info,
        }),
    ]
}

fn action_log() -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(action(), 0..80)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: replay is deterministic
    #[test]
    fn prop_replay_is_deterministic(actions in action_log()) {
        let a = AppState::replay(AppState::default(), actions.clone());
        let b = AppState::replay(AppState::default(), actions);
        prop_assert_eq!(a, b);
    }

    /// Property: replaying a log in two pieces equals replaying it whole
    #[test]
    fn prop_replay_composes(actions in action_log(), split in any::<prop::sample::Index>()) {
        let at = split.index(actions.len() + 1);
        let (head, tail) = actions.split_at(at);

        let whole = AppState::replay(AppState::default(), actions.clone());
        let midway = AppState::replay(AppState::default(), head.to_vec());
        let pieces = AppState::replay(midway, tail.to_vec());

        prop_assert_eq!(whole, pieces);
    }

    /// Property: the displayed source never moves back in time
    #[test]
    fn prop_displayed_source_never_regresses(actions in action_log()) {
        let mut state = AppState::default();
        for action in &actions {
            let next = state.reduce(action);
            if let (Some(before), Some(after)) =
                (&state.current_source.source, &next.current_source.source)
            {
                if before.id == after.id {
                    if let (Some(was), Some(now)) = (before.modified, after.modified) {
                        prop_assert!(now >= was, "{} regressed on {:?}", before.id, action);
                    }
                }
            }
            state = next;
        }
    }

    /// Property: every branch invariant holds after any log
    #[test]
    fn prop_branch_invariants_hold(actions in action_log()) {
        let state = AppState::replay(AppState::default(), actions);

        let current = &state.current_source;
        if current.loading {
            prop_assert!(current.requested.is_some());
            prop_assert!(current.load_error.is_none());
        }
        prop_assert!(state.notifications.items.len() <= MAX_NOTIFICATIONS);
        if !state.sharing.is_empty() {
            prop_assert!(state.sharing.obj_id.is_some());
        }
    }
}
