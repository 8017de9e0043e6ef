// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation from the local kubeconfig

use crate::error::{Result, SetupError};
use k8s_openapi::api::core::v1::Secret;
use kube::{config::KubeConfigOptions, Api, Client, Config as KConfig};
use tracing::{debug, info, instrument};

/// Create a client for the given kubeconfig context, or for the current
/// context (or in-cluster config) when none is given.
#[instrument]
pub async fn connect(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                SetupError::KubeconfigError(format!(
                    "Failed to load context '{}': {}",
                    context, e
                ))
            })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| SetupError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    debug!("Using cluster URL {}", config.cluster_url);

    let client = Client::try_from(config)
        .map_err(|e| SetupError::KubeconfigError(format!("Failed to create client: {}", e)))?;

    info!(
        "Connected to cluster{}",
        context.map(|c| format!(" (context {})", c)).unwrap_or_default()
    );
    Ok(client)
}

/// Read one key of a secret as UTF-8 text
#[instrument(skip(client))]
pub async fn read_secret_value(
    client: &Client,
    namespace: &str,
    name: &str,
    key: &str,
) -> Result<String> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    let secret = secrets
        .get_opt(name)
        .await?
        .ok_or_else(|| SetupError::NotFound(format!("secret {}/{}", namespace, name)))?;

    let Some(data) = secret.data.as_ref() else {
        return Err(SetupError::NotFound(format!(
            "secret {}/{} has no data",
            namespace, name
        )));
    };

    let Some(value) = data.get(key) else {
        return Err(SetupError::NotFound(format!(
            "secret {}/{} does not contain '{}' key",
            namespace, name, key
        )));
    };

    String::from_utf8(value.0.clone()).map_err(|e| {
        SetupError::StateError(format!(
            "Failed to decode key '{}' of secret {}/{}: {}",
            key, namespace, name, e
        ))
    })
}
