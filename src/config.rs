// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration for a synchronization session
//!
//! Every section has a `Default` suitable for a local development server.
//! [`SyncConfig::from_env`] overlays environment variables on top of the
//! defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `SURVEY_API_URL` | `http://localhost:5000` |
//! | `SURVEY_API_TOKEN` | unset |
//! | `SURVEY_NATS_URL` | `nats://localhost:4222` |
//! | `SURVEY_PUSH_PREFIX` | `survey.push` |
//! | `SURVEY_RECONNECT_INITIAL_MS` | `500` |
//! | `SURVEY_RECONNECT_MAX_MS` | `30000` |
//! | `SURVEY_HEARTBEAT_SECS` | `30` |
//! | `SURVEY_AUTH_TIMEOUT_SECS` | `10` |
//! | `SURVEY_PLOT_CACHE_CAPACITY` | `40` |

use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;
use crate::errors::{SyncError, SyncResult};

/// Top-level session configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Request/response API settings
    pub api: ApiConfig,
    /// Push channel settings
    pub push: PushConfig,
    /// Capacity of the derived plot cache
    pub plot_cache_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            push: PushConfig::default(),
            plot_cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Configuration for the request/response API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Bearer token presented on every request
    pub token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for the push channel
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// NATS server URLs carrying the push channel
    pub servers: Vec<String>,
    /// Client name announced to the server
    pub name: String,
    /// Subject prefix; a session uses `{prefix}.{session}.up` / `.down`
    pub subject_prefix: String,
    /// Connection timeout when opening the channel
    pub connect_timeout: Duration,
    /// How long to wait for the server to accept the auth token
    pub auth_timeout: Duration,
    /// Keep-alive period while connected
    pub heartbeat_interval: Duration,
    /// Reconnect backoff
    pub backoff: BackoffConfig,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "survey-sync".to_string(),
            subject_prefix: "survey.push".to_string(),
            connect_timeout: Duration::from_secs(10),
            auth_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Bounded exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Growth factor per consecutive failure
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Used by [`SyncConfig::from_env`]; tests pass a map instead of touching
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SURVEY_API_URL") {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        config.api.token = lookup("SURVEY_API_TOKEN").filter(|t| !t.is_empty());

        if let Some(servers) = lookup("SURVEY_NATS_URL") {
            config.push.servers = servers.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(prefix) = lookup("SURVEY_PUSH_PREFIX") {
            config.push.subject_prefix = prefix;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SURVEY_RECONNECT_INITIAL_MS")? {
            config.push.backoff.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SURVEY_RECONNECT_MAX_MS")? {
            config.push.backoff.max_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SURVEY_HEARTBEAT_SECS")? {
            config.push.heartbeat_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SURVEY_AUTH_TIMEOUT_SECS")? {
            config.push.auth_timeout = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, "SURVEY_PLOT_CACHE_CAPACITY")? {
            config.plot_cache_capacity = capacity;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the session cannot run with
    pub fn validate(&self) -> SyncResult<()> {
        if self.plot_cache_capacity == 0 {
            return Err(SyncError::Configuration(
                "plot cache capacity must be at least 1".to_string(),
            ));
        }
        if self.push.backoff.initial_delay > self.push.backoff.max_delay {
            return Err(SyncError::Configuration(
                "reconnect initial delay exceeds maximum delay".to_string(),
            ));
        }
        if self.push.heartbeat_interval.is_zero() {
            return Err(SyncError::Configuration(
                "heartbeat interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> SyncResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SyncError::Configuration(format!("{key}={raw:?}: {e}"))),
    }
}
