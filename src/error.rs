// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    ApiError {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Timed out after {}s waiting for {what} (last observed: {})", .waited.as_secs(), .last_observed.as_deref().unwrap_or("<none>"))]
    Timeout {
        what: String,
        waited: Duration,
        last_observed: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Base64 decoding failed: {0}")]
    DecodeError(#[from] base64::DecodeError),
}

impl SetupError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SetupError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;
