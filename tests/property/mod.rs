// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! This module contains property-based tests using proptest to verify
//! fundamental properties of the store and its derived cache.

mod cache_invariants;
mod replay;
