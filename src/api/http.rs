// Copyright (c) 2025 - Cowboy AI, Inc.

//! HTTP implementation of [`ApiClient`]
//!
//! Enabled with the `http` feature.
//!
//! ```rust,no_run
//! use survey_sync::api::{self, HttpApiClient};
//! use survey_sync::config::ApiConfig;
//!
//! # async fn run() -> survey_sync::errors::SyncResult<()> {
//! let client = HttpApiClient::new(ApiConfig::default())?;
//! let groups = api::fetch_groups(&client).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiClient, ApiResponse, Method};
use crate::config::ApiConfig;
use crate::errors::{SyncError, SyncResult};

/// [`ApiClient`] over HTTP with bearer-token authentication
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    config: ApiConfig,
    client: Client,
}

impl HttpApiClient {
    /// Build a client for `config.base_url`
    pub fn new(config: ApiConfig) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SyncError::Configuration(format!("Invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                SyncError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Absolute URL of an API path
    ///
    /// Path segments are percent-encoded; the query string is kept verbatim.
    pub fn url(&self, path: &str) -> String {
        let (segments, query) = match path.split_once('?') {
            Some((segments, query)) => (segments, Some(query)),
            None => (path, None),
        };
        let encoded: Vec<String> = segments
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        let mut url = format!("{}/api/{}", self.config.base_url, encoded.join("/"));
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> SyncResult<ApiResponse> {
        let url = self.url(path);
        debug!(%method, %url, "API request");

        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = match body {
            Some(body) => builder.json(&body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::Timeout(format!("{method} {url}"))
            } else {
                SyncError::RequestFailed(format!("{method} {url}: {e}"))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::RequestFailed(format!("{method} {url}: {e}")))?;

        // Error statuses usually still carry the envelope; prefer its message
        match serde_json::from_str::<ApiResponse>(&text) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                warn!(%method, %url, %status, "API returned a non-envelope error");
                Ok(ApiResponse::error(format!("{status}: {text}")))
            }
            Err(e) => Err(SyncError::Serialization(format!(
                "{method} {url} returned a malformed envelope: {e}"
            ))),
        }
    }
}
