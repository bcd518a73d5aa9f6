// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded exponential reconnect backoff

use std::time::Duration;

use crate::config::BackoffConfig;

/// Delay schedule for consecutive failed attempts
///
/// `delay(n) = min(initial * multiplier^(n - 1), max)` for `n >= 1`, so the
/// schedule is non-decreasing and never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    multiplier: u32,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration, multiplier: u32) -> Self {
        Self {
            initial: initial.min(max),
            max,
            multiplier: multiplier.max(1),
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    pub fn max_delay(&self) -> Duration {
        self.max
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffConfig::default().into()
    }
}

impl From<BackoffConfig> for BackoffPolicy {
    fn from(config: BackoffConfig) -> Self {
        Self::new(config.initial_delay, config.max_delay, config.multiplier)
    }
}
