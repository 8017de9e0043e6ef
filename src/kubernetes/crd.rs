// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::error::{Result, SetupError};
use crate::wait::{wait_for, WaitOptions};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::runtime::wait::{conditions::is_crd_established, Condition};
use kube::{Api, Client};

/// Wait for a CustomResourceDefinition to exist and be Established.
///
/// Operators register their CRDs some time after their CSV succeeds, so
/// applying a custom resource right after install can fail without this.
pub async fn wait_for_crd(client: &Client, name: &str, options: &WaitOptions) -> Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let established = &is_crd_established();

    wait_for(
        &format!("CRD {}", name),
        options,
        || {
            let crds = crds.clone();
            async move {
                let crd = crds.get_opt(name).await?;
                Ok(Some(established.matches_object(crd.as_ref())))
            }
        },
        |ready: &bool| *ready,
    )
    .await
    .map_err(|e| match e {
        SetupError::Timeout { .. } => SetupError::NotFound(format!("CRD {} not found", name)),
        other => other,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;

    fn crd_json(name: &str, established: &str) -> String {
        serde_json::json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": name },
            "spec": {
                "group": "platform.stackrox.io",
                "names": { "kind": "Central", "plural": "centrals" },
                "scope": "Namespaced",
                "versions": []
            },
            "status": {
                "conditions": [{ "type": "Established", "status": established }]
            }
        })
        .to_string()
    }

    const PATH: &str = "/apis/apiextensions.k8s.io/v1/customresourcedefinitions/centrals.platform.stackrox.io";

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_crd_established() {
        let client = MockService::new()
            .on_get_sequence(
                PATH,
                vec![
                    (200, crd_json("centrals.platform.stackrox.io", "False")),
                    (200, crd_json("centrals.platform.stackrox.io", "True")),
                ],
            )
            .into_client();

        wait_for_crd(
            &client,
            "centrals.platform.stackrox.io",
            &WaitOptions::from_secs(1, 10),
        )
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_crd_missing() {
        let client = MockService::new().into_client();

        let err = wait_for_crd(
            &client,
            "centrals.platform.stackrox.io",
            &WaitOptions::from_secs(1, 3),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("CRD centrals.platform.stackrox.io not found"));
    }
}
