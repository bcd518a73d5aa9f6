// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties that must hold for
//! all action sequences: the derived cache stays bounded and consistent,
//! and replaying an action log always rebuilds the same state.

mod property;
