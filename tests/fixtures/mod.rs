// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for survey-sync
//!
//! Provides deterministic sources, datasets and a scripted API client.
//! All identifiers and timestamps are fixed constants so tests are
//! reproducible.
//!
//! # Design Principles
//! - All test data is deterministic (no `Uuid::now_v7()` or `Utc::now()`)
//! - The scripted API records every call so tests can assert "no request"
//! - A gated reply holds a response until the test releases it

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::oneshot;

use survey_sync::api::{self, ApiClient, ApiResponse, Method};
use survey_sync::connection::Frame;
use survey_sync::errors::{SyncError, SyncResult};
use survey_sync::model::{ObjId, Photometry, PhotometryId, Source, Spectrum, SpectrumId};
use survey_sync::transport::{MemoryServer, ServerConnection};

pub const SOURCE_A: &str = "SN2020x";
pub const SOURCE_B: &str = "ZTF21aaqjmps";

pub const PUSH_TOKEN: &str = "01934f4a-70c0-7000-8000-0000000070c0";

// Fixed test timestamps
pub const EARLIER: &str = "2026-01-19T12:00:00Z";
pub const LATER: &str = "2026-01-19T13:00:00Z";

pub fn timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// A source document as the server sends it
pub fn source_json(id: &str, redshift: f64, modified: &str) -> Value {
    json!({
        "id": id,
        "ra": 150.125,
        "dec": 2.5,
        "redshift": redshift,
        "modified": modified,
        "comments": [],
        "groups": [{ "id": 1, "name": "Sitewide" }],
    })
}

pub fn source(id: &str, redshift: f64, modified: &str) -> Source {
    serde_json::from_value(source_json(id, redshift, modified)).expect("Invalid source fixture")
}

pub fn source_without_timestamp(id: &str) -> Source {
    Source {
        id: ObjId::new(id),
        ra: 0.0,
        dec: 0.0,
        redshift: None,
        modified: None,
        comments: Vec::new(),
        groups: Vec::new(),
        extra: Map::new(),
    }
}

pub fn photometry(obj_id: &str, ids: &[i64]) -> Vec<Photometry> {
    ids.iter()
        .map(|&id| Photometry {
            id: PhotometryId(id),
            obj_id: ObjId::new(obj_id),
            mjd: 59_000.0 + id as f64,
            mag: Some(18.5),
            magerr: Some(0.05),
            filter: "ztfr".into(),
            instrument_id: 1,
        })
        .collect()
}

pub fn spectra(obj_id: &str, ids: &[i64]) -> Vec<Spectrum> {
    ids.iter()
        .map(|&id| Spectrum {
            id: SpectrumId(id),
            obj_id: ObjId::new(obj_id),
            observed_at: timestamp(EARLIER),
            instrument_id: 2,
            wavelengths: vec![4000.0, 5000.0],
            fluxes: vec![1.0e-16, 2.0e-16],
        })
        .collect()
}

/// One recorded API call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Scripted [`ApiClient`]
///
/// Paths answer with a fixed response set by [`MockApi::respond`]; a gate
/// set by [`MockApi::gate`] takes precedence for the next call only.
#[derive(Default)]
pub struct MockApi {
    responses: Mutex<HashMap<String, ApiResponse>>,
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<ApiResponse>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A mock that hands out push tokens
    pub fn with_token() -> Arc<Self> {
        let api = Self::new();
        api.respond(api::PUSH_TOKEN_PATH, ApiResponse::success(json!({ "token": PUSH_TOKEN })));
        api
    }

    pub fn respond(&self, path: &str, response: ApiResponse) {
        self.responses.lock().unwrap().insert(path.to_string(), response);
    }

    pub fn respond_data(&self, path: &str, data: Value) {
        self.respond(path, ApiResponse::success(data));
    }

    /// Hold the next call to `path` until the returned sender fires
    pub fn gate(&self, path: &str) -> oneshot::Sender<ApiResponse> {
        let (release, held) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(held);
        release
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.path == path).count()
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> SyncResult<ApiResponse> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });

        let gated = self
            .gates
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        if let Some(held) = gated {
            return held
                .await
                .map_err(|_| SyncError::Transport(format!("gate for {path} dropped")));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| ApiResponse::error(format!("no route for {path}"))))
    }
}

/// Accept the next channel, check the auth frame and accept it
pub async fn accept_authenticated(server: &mut MemoryServer) -> ServerConnection {
    let mut conn = server.accept().await.expect("client never opened a channel");
    let auth = conn.recv().await.expect("client closed before authenticating");
    assert_eq!(auth, Frame::auth(PUSH_TOKEN));
    conn.send(Frame::auth_ok()).expect("client went away");
    conn
}

/// Poll `condition` until it holds or five seconds pass
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {what}");
}
