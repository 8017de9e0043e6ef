// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::Result;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure a namespace exists in the cluster, create if it doesn't
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(namespace).await {
        Ok(_) => {
            debug!("Namespace {} already exists", namespace);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating namespace {}", namespace);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(namespace.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            match namespaces.create(&PostParams::default(), &ns).await {
                Ok(_) => {}
                // Created concurrently by an operator between our get and create
                Err(kube::Error::Api(err)) if err.code == 409 => {}
                Err(e) => return Err(e.into()),
            }
            info!("Namespace {} created successfully", namespace);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{namespace_json, MockService};

    #[tokio::test]
    async fn test_existing_namespace_is_not_created() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/stackrox",
            200,
            &namespace_json("stackrox"),
        );

        ensure_namespace_exists(&mock.client(), "stackrox").await.unwrap();

        assert!(mock.requests().iter().all(|r| r.method == "GET"));
    }

    #[tokio::test]
    async fn test_missing_namespace_is_created() {
        let mock =
            MockService::new().on_post("/api/v1/namespaces", 201, &namespace_json("stackrox"));

        ensure_namespace_exists(&mock.client(), "stackrox").await.unwrap();

        let bodies = mock.bodies("POST", "/api/v1/namespaces");
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["metadata"]["name"], "stackrox");
    }
}
