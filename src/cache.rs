// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded Derived Cache
//!
//! A fixed-capacity cache mapping a request [`Fingerprint`] to a computed
//! artifact (a rendered plot payload, for instance).
//!
//! # Ordering
//!
//! Eviction is strict *insertion* order: the oldest inserted key goes first.
//! Re-putting a key that is already present replaces its value and keeps its
//! original position. Under repeated re-fetch of the same key this differs
//! from LRU, which would move the key to the head.
//!
//! # Eviction
//!
//! Eviction is two-phase and happens inside a single `put`:
//!
//! ```text
//! 1. trim the ordered key list to `capacity`
//! 2. sweep the value map and the owner index down to the keys still listed
//! ```
//!
//! Because the cache is a value owned by a store branch, both phases complete
//! inside one reduction and no reader ever observes the intermediate state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use crate::model::{ObjId, PlotKind};
use crate::state_machine::StateInvariant;

/// Default number of live entries
pub const DEFAULT_CAPACITY: usize = 40;

/// Deterministic key derived from the request that produced an artifact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    endpoint: String,
    entity: ObjId,
}

impl Fingerprint {
    /// Fingerprint for `endpoint` applied to `entity`
    pub fn new(endpoint: impl Into<String>, entity: ObjId) -> Self {
        Self {
            endpoint: endpoint.into(),
            entity,
        }
    }

    /// Fingerprint of a plot request
    pub fn plot(kind: PlotKind, entity: ObjId) -> Self {
        Self::new(kind.endpoint(), entity)
    }

    /// Endpoint part of the key
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Entity that owns the artifact
    pub fn entity(&self) -> &ObjId {
        &self.entity
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.entity)
    }
}

/// A live cache entry
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// Key of the entry
    pub key: Fingerprint,
    /// Cached artifact
    pub value: V,
    /// Insertion ordinal, strictly increasing across the cache's life
    pub inserted_at: u64,
}

/// Fixed-capacity, insertion-ordered cache
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedCache<V> {
    capacity: usize,
    /// Newest first
    order: VecDeque<Fingerprint>,
    entries: HashMap<Fingerprint, CacheEntry<V>>,
    /// Owner index used for invalidation on entity re-fetch
    by_entity: HashMap<ObjId, BTreeSet<Fingerprint>>,
    next_ordinal: u64,
}

impl<V> Default for BoundedCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<V> BoundedCache<V> {
    /// Create an empty cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
            by_entity: HashMap::new(),
            next_ordinal: 0,
        }
    }

    /// Maximum number of live entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up an artifact
    pub fn get(&self, key: &Fingerprint) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Look up an entry with its metadata
    pub fn entry(&self, key: &Fingerprint) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Whether `key` is live
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order, newest first
    pub fn keys(&self) -> impl Iterator<Item = &Fingerprint> {
        self.order.iter()
    }

    /// Keys owned by `entity`
    pub fn keys_for(&self, entity: &ObjId) -> impl Iterator<Item = &Fingerprint> {
        self.by_entity.get(entity).into_iter().flatten()
    }

    /// Insert an artifact, returning the keys evicted to stay within capacity
    ///
    /// A key already present keeps its position; only its value changes.
    pub fn put(&mut self, key: Fingerprint, value: V) -> Vec<Fingerprint> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            return Vec::new();
        }

        let inserted_at = self.next_ordinal;
        self.next_ordinal += 1;

        self.order.push_front(key.clone());
        self.by_entity
            .entry(key.entity().clone())
            .or_default()
            .insert(key.clone());
        self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                inserted_at,
            },
        );

        self.evict_overflow()
    }

    /// Drop one key; returns whether it was live
    pub fn invalidate(&mut self, key: &Fingerprint) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.order.retain(|k| k != key);
        if let Some(keys) = self.by_entity.get_mut(key.entity()) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_entity.remove(key.entity());
            }
        }
        true
    }

    /// Drop every key owned by `entity`; returns how many were removed
    pub fn invalidate_entity(&mut self, entity: &ObjId) -> usize {
        let Some(keys) = self.by_entity.remove(entity) else {
            return 0;
        };
        self.order.retain(|k| !keys.contains(k));
        for key in &keys {
            self.entries.remove(key);
        }
        keys.len()
    }

    /// Drop every key owned by `entity` whose endpoint is `endpoint`
    pub fn invalidate_endpoint(&mut self, endpoint: &str, entity: &ObjId) -> usize {
        let doomed: Vec<Fingerprint> = self
            .keys_for(entity)
            .filter(|k| k.endpoint() == endpoint)
            .cloned()
            .collect();
        doomed.iter().filter(|k| self.invalidate(k)).count()
    }

    fn evict_overflow(&mut self) -> Vec<Fingerprint> {
        if self.order.len() <= self.capacity {
            return Vec::new();
        }

        let evicted: Vec<Fingerprint> = self.order.drain(self.capacity..).collect();

        let live: HashSet<&Fingerprint> = self.order.iter().collect();
        self.entries.retain(|k, _| live.contains(k));
        self.by_entity.retain(|_, keys| {
            keys.retain(|k| live.contains(k));
            !keys.is_empty()
        });

        evicted
    }
}

impl<V> StateInvariant for BoundedCache<V> {
    fn check_invariants(&self) -> Result<(), String> {
        if self.order.len() > self.capacity {
            return Err(format!(
                "{} entries exceed capacity {}",
                self.order.len(),
                self.capacity
            ));
        }
        if self.order.len() != self.entries.len() {
            return Err(format!(
                "ordered keys ({}) and values ({}) disagree",
                self.order.len(),
                self.entries.len()
            ));
        }
        let mut seen = HashSet::new();
        for key in &self.order {
            if !seen.insert(key) {
                return Err(format!("duplicate key {key}"));
            }
            if !self.entries.contains_key(key) {
                return Err(format!("key {key} has no value"));
            }
        }
        for (entity, keys) in &self.by_entity {
            if keys.is_empty() {
                return Err(format!("empty index bucket for {entity}"));
            }
            for key in keys {
                if key.entity() != entity || !self.entries.contains_key(key) {
                    return Err(format!("orphaned index entry {key}"));
                }
            }
        }
        let indexed: usize = self.by_entity.values().map(BTreeSet::len).sum();
        if indexed != self.entries.len() {
            return Err(format!(
                "index covers {indexed} keys, cache holds {}",
                self.entries.len()
            ));
        }
        Ok(())
    }
}
