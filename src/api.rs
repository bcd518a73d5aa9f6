// Copyright (c) 2025 - Cowboy AI, Inc.
//! Request/Response API
//!
//! Every resource call returns the same envelope:
//!
//! ```text
//! { "status": "success" | "error", "data": ..., "message": "..." }
//! ```
//!
//! [`ApiClient`] is the transport seam: implementations move an envelope
//! across the wire and nothing else. The typed endpoint functions in this
//! module unwrap the envelope and decode `data`, turning an `"error"` status
//! into [`SyncError::RequestFailed`].
//!
//! Paths are relative to the API root (`{base_url}/api/`).

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpApiClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::{SyncError, SyncResult};
use crate::model::{Group, ObjId, Photometry, PlotArtifact, PlotKind, Profile, Source, SourcePage, Spectrum};
use crate::sharing::ShareRequest;

/// HTTP verb of a resource call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The envelope every endpoint answers with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    /// A successful envelope carrying `data`
    pub fn success(data: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            data,
            message: None,
        }
    }

    /// An error envelope
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    /// The payload of a successful envelope
    pub fn into_data(self) -> SyncResult<Value> {
        match self.status {
            ResponseStatus::Success => Ok(self.data),
            ResponseStatus::Error => Err(SyncError::RequestFailed(
                self.message
                    .unwrap_or_else(|| "request failed without a message".to_string()),
            )),
        }
    }

    /// Decode the payload of a successful envelope
    pub fn decode<T: DeserializeOwned>(self) -> SyncResult<T> {
        let data = self.into_data()?;
        serde_json::from_value(data).map_err(SyncError::from)
    }
}

/// A client able to issue one resource call
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Perform `method path` with an optional JSON body
    async fn request(&self, method: Method, path: &str, body: Option<Value>)
        -> SyncResult<ApiResponse>;
}

/// Path of a single source
pub fn source_path(obj_id: &ObjId) -> String {
    format!("sources/{obj_id}")
}

/// Path of a source list page
pub fn sources_path(page_number: u32) -> String {
    format!("sources?pageNumber={page_number}")
}

/// Path of an object's photometry
pub fn photometry_path(obj_id: &ObjId) -> String {
    format!("sources/{obj_id}/photometry")
}

/// Path of an object's spectra
pub fn spectra_path(obj_id: &ObjId) -> String {
    format!("sources/{obj_id}/spectra")
}

/// Path of a rendered plot
pub fn plot_path(kind: PlotKind, obj_id: &ObjId) -> String {
    format!("internal/{}/{obj_id}", kind.endpoint())
}

pub const GROUPS_PATH: &str = "groups";
pub const PROFILE_PATH: &str = "internal/profile";
pub const PUSH_TOKEN_PATH: &str = "internal/tokens/push";
pub const SHARING_PATH: &str = "sharing";

/// Path used to register that a source was viewed
pub fn source_view_path(obj_id: &ObjId) -> String {
    format!("internal/source_views/{obj_id}")
}

async fn get<T: DeserializeOwned>(api: &dyn ApiClient, path: &str) -> SyncResult<T> {
    api.request(Method::Get, path, None).await?.decode()
}

pub async fn fetch_source(api: &dyn ApiClient, obj_id: &ObjId) -> SyncResult<Source> {
    get(api, &source_path(obj_id)).await
}

pub async fn fetch_sources(api: &dyn ApiClient, page_number: u32) -> SyncResult<SourcePage> {
    get(api, &sources_path(page_number)).await
}

pub async fn fetch_groups(api: &dyn ApiClient) -> SyncResult<Vec<Group>> {
    get(api, GROUPS_PATH).await
}

pub async fn fetch_profile(api: &dyn ApiClient) -> SyncResult<Profile> {
    get(api, PROFILE_PATH).await
}

pub async fn fetch_photometry(api: &dyn ApiClient, obj_id: &ObjId) -> SyncResult<Vec<Photometry>> {
    get(api, &photometry_path(obj_id)).await
}

pub async fn fetch_spectra(api: &dyn ApiClient, obj_id: &ObjId) -> SyncResult<Vec<Spectrum>> {
    get(api, &spectra_path(obj_id)).await
}

/// Fetch a rendered plot; the request path is recorded on the artifact
pub async fn fetch_plot(
    api: &dyn ApiClient,
    kind: PlotKind,
    obj_id: &ObjId,
) -> SyncResult<PlotArtifact> {
    let path = plot_path(kind, obj_id);
    let mut plot: PlotArtifact = get(api, &path).await?;
    if plot.url.is_empty() {
        plot.url = path;
    }
    Ok(plot)
}

#[derive(Deserialize)]
struct PushToken {
    token: String,
}

/// Obtain a short-lived token for the push channel handshake
pub async fn fetch_push_token(api: &dyn ApiClient) -> SyncResult<String> {
    let PushToken { token } = get(api, PUSH_TOKEN_PATH).await?;
    Ok(token)
}

/// Submit one sharing request; returns the server's message, if any
pub async fn share_data(api: &dyn ApiClient, request: &ShareRequest) -> SyncResult<Option<String>> {
    let body = serde_json::to_value(request)?;
    let response = api.request(Method::Post, SHARING_PATH, Some(body)).await?;
    let message = response.message.clone();
    response.into_data()?;
    Ok(message)
}

/// Record that the user viewed a source
pub async fn register_source_view(api: &dyn ApiClient, obj_id: &ObjId) -> SyncResult<()> {
    api.request(Method::Post, &source_view_path(obj_id), None)
        .await?
        .into_data()
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_parsing() {
        let ok: ApiResponse =
            serde_json::from_value(json!({ "status": "success", "data": { "token": "abc" } }))
                .unwrap();
        assert_eq!(ok.into_data().unwrap(), json!({ "token": "abc" }));

        let err: ApiResponse =
            serde_json::from_value(json!({ "status": "error", "message": "Invalid source ID" }))
                .unwrap();
        assert_eq!(
            err.into_data(),
            Err(SyncError::RequestFailed("Invalid source ID".into()))
        );
    }

    #[test]
    fn test_decode_mismatch_is_serialization_error() {
        let response = ApiResponse::success(json!({ "unexpected": true }));
        let result: SyncResult<Source> = response.decode();
        assert!(matches!(result, Err(SyncError::Serialization(_))));
    }

    #[test]
    fn test_paths() {
        let id = ObjId::new("ZTF20abc");
        assert_eq!(source_path(&id), "sources/ZTF20abc");
        assert_eq!(sources_path(3), "sources?pageNumber=3");
        assert_eq!(plot_path(PlotKind::Spectroscopy, &id), "internal/plot/spectroscopy/ZTF20abc");
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }
}
