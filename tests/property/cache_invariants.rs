// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Bounded Derived Cache
//!
//! Drives [`BoundedCache`] and the plot branch with random operation
//! sequences and checks the size bound and index consistency after every
//! step.

use proptest::prelude::*;
use serde_json::json;
use survey_sync::action::Action;
use survey_sync::cache::{BoundedCache, Fingerprint};
use survey_sync::model::{ObjId, PlotArtifact, PlotKind};
use survey_sync::state_machine::StateInvariant;
use survey_sync::store::AppState;

// ============================================================================
// Strategies
// ============================================================================

#[derive(Debug, Clone)]
enum CacheOp {
    Put(Fingerprint, u32),
    Invalidate(Fingerprint),
    InvalidateEntity(ObjId),
    InvalidateEndpoint(PlotKind, ObjId),
}

fn obj_id() -> impl Strategy<Value = ObjId> {
    // A small pool so keys collide and entities own several keys
    (0u8..12).prop_map(|n| ObjId::new(format!("ZTF{n:02}")))
}

fn plot_kind() -> impl Strategy<Value = PlotKind> {
    prop_oneof![Just(PlotKind::Photometry), Just(PlotKind::Spectroscopy)]
}

fn fingerprint() -> impl Strategy<Value = Fingerprint> {
    (plot_kind(), obj_id()).prop_map(|(kind, id)| Fingerprint::plot(kind, id))
}

fn cache_op() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (fingerprint(), any::<u32>()).prop_map(|(k, v)| CacheOp::Put(k, v)),
        1 => fingerprint().prop_map(CacheOp::Invalidate),
        1 => obj_id().prop_map(CacheOp::InvalidateEntity),
        1 => (plot_kind(), obj_id()).prop_map(|(k, id)| CacheOp::InvalidateEndpoint(k, id)),
    ]
}

fn artifact(n: u32) -> PlotArtifact {
    PlotArtifact {
        docs_json: json!({ "n": n }),
        render_items: json!([]),
        custom_model_js: None,
        url: String::new(),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: the cache never exceeds its capacity and its index always
    /// agrees with its contents
    #[test]
    fn prop_cache_bounded_and_consistent(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op(), 0..200),
    ) {
        let mut cache = BoundedCache::new(capacity);

        for op in ops {
            match op {
                CacheOp::Put(key, value) => {
                    let before = cache.len();
                    let existed = cache.contains(&key);
                    let evicted = cache.put(key.clone(), value);

                    prop_assert_eq!(cache.get(&key), Some(&value));
                    prop_assert!(!evicted.contains(&key));
                    if existed {
                        prop_assert!(evicted.is_empty());
                        prop_assert_eq!(cache.len(), before);
                    }
                }
                CacheOp::Invalidate(key) => {
                    cache.invalidate(&key);
                    prop_assert!(!cache.contains(&key));
                }
                CacheOp::InvalidateEntity(id) => {
                    cache.invalidate_entity(&id);
                    prop_assert_eq!(cache.keys_for(&id).count(), 0);
                }
                CacheOp::InvalidateEndpoint(kind, id) => {
                    cache.invalidate_endpoint(kind.endpoint(), &id);
                    prop_assert!(!cache.contains(&Fingerprint::plot(kind, id)));
                }
            }

            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.check_invariants(), Ok(()));
        }
    }

    /// Property: inserting more distinct keys than the capacity evicts
    /// exactly the oldest insertions
    #[test]
    fn prop_overflow_evicts_oldest(capacity in 1usize..10, extra in 1usize..10) {
        let keys: Vec<Fingerprint> = (0..capacity + extra)
            .map(|n| Fingerprint::plot(PlotKind::Photometry, ObjId::new(format!("obj{n}"))))
            .collect();

        let mut cache = BoundedCache::new(capacity);
        let mut evicted = Vec::new();
        for (n, key) in keys.iter().enumerate() {
            evicted.extend(cache.put(key.clone(), n));
        }

        prop_assert_eq!(cache.len(), capacity);
        prop_assert_eq!(&evicted[..], &keys[..extra]);
        for key in &keys[extra..] {
            prop_assert!(cache.contains(key));
        }
    }

    /// Property: the plot branch of the store stays within the configured
    /// capacity however many plots resolve
    #[test]
    fn prop_plot_branch_bounded(
        capacity in 1usize..6,
        resolved in prop::collection::vec((fingerprint(), any::<u32>()), 0..60),
    ) {
        let actions = resolved.into_iter().flat_map(|(fingerprint, n)| {
            [
                Action::FetchPlot { fingerprint: fingerprint.clone() },
                Action::FetchPlotOk { fingerprint, plot: artifact(n) },
            ]
        });

        let state = AppState::replay(AppState::with_plot_capacity(capacity), actions);

        prop_assert!(state.plots.cache.len() <= capacity);
        prop_assert!(state.plots.pending.is_empty());
        prop_assert_eq!(state.plots.cache.check_invariants(), Ok(()));
    }
}
