// Copyright (c) 2025 - Cowboy AI, Inc.
//! Push frames: `{ "kind": <tag>, "data": <JSON> }`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// First frame sent by the client, carrying the auth token
pub const AUTH: &str = "auth";
/// Server accepted the token
pub const AUTH_OK: &str = "auth_ok";
/// Server refused the token
pub const AUTH_REJECTED: &str = "auth_rejected";
/// Keep-alive request
pub const PING: &str = "ping";
/// Keep-alive acknowledgment
pub const PONG: &str = "pong";

/// One message on the push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Handshake frame presenting `token`
    pub fn auth(token: &str) -> Self {
        Self::new(AUTH, json!({ "token": token }))
    }

    pub fn auth_ok() -> Self {
        Self::new(AUTH_OK, Value::Null)
    }

    /// Rejection with a reason
    pub fn auth_rejected(reason: &str) -> Self {
        Self::new(AUTH_REJECTED, json!({ "reason": reason }))
    }

    pub fn ping() -> Self {
        Self::new(PING, Value::Null)
    }

    pub fn pong() -> Self {
        Self::new(PONG, Value::Null)
    }

    /// Whether the frame belongs to the channel protocol rather than the domain
    pub fn is_control(&self) -> bool {
        matches!(
            self.kind.as_str(),
            AUTH | AUTH_OK | AUTH_REJECTED | PING | PONG
        )
    }

    /// Reason carried by an `auth_rejected` frame
    pub fn reason(&self) -> String {
        self.data
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("token rejected")
            .to_string()
    }
}
