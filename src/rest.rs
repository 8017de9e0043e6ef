// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Shared HTTP plumbing for REST endpoints exposed through cluster routes

use crate::config::HttpSettings;
use crate::error::{Result, SetupError};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

/// Build the shared HTTP client for cluster routes
pub fn http_client(settings: &HttpSettings) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .danger_accept_invalid_certs(settings.insecure_skip_tls_verify)
        .build()?)
}

/// Turn `host:443` or a full URL into a base URL
pub fn base_url(endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    Url::parse(&candidate)
        .map_err(|e| SetupError::ConfigError(format!("invalid endpoint '{}': {}", endpoint, e)))
}

/// Send a request and turn non-2xx answers into [`SetupError::ApiError`]
pub async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(SetupError::ApiError { url, status, body })
}
