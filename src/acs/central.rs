// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Central installation

use crate::config::{AcsSettings, Settings};
use crate::constants::acs::{
    ADMIN_USER, CENTRAL_ROUTE, DEPLOYED_CONDITION, HTPASSWD_PASSWORD_KEY, HTPASSWD_SECRET,
    PASSTHROUGH,
};
use crate::error::Result;
use crate::kubernetes::routes::wait_for_route_termination;
use crate::kubernetes::{
    apply_object, ensure_namespace_exists, read_secret_value, wait_for_crd, wait_for_resource,
    FieldProbe, ResourceRef,
};
use crate::olm::install_operator;
use crate::state::StateStore;
use kube::Client;
use serde_json::{json, Value};
use tracing::{info, instrument};

pub const CENTRAL_API_VERSION: &str = "platform.stackrox.io/v1alpha1";
pub const CENTRAL_CRD: &str = "centrals.platform.stackrox.io";

/// What later steps need to talk to Central
#[derive(Debug, Clone)]
pub struct CentralEndpoint {
    /// `host:443`, the form roxctl expects
    pub address: String,
    pub username: String,
    pub password: String,
}

pub fn central_ref(settings: &AcsSettings) -> ResourceRef {
    ResourceRef::namespaced(
        CENTRAL_API_VERSION,
        "Central",
        &settings.central_name,
        &settings.namespace,
    )
}

/// The Central custom resource, exposed through a passthrough route
pub fn central_manifest(settings: &AcsSettings) -> Value {
    json!({
        "apiVersion": CENTRAL_API_VERSION,
        "kind": "Central",
        "metadata": {
            "name": settings.central_name,
            "namespace": settings.namespace
        },
        "spec": {
            "central": {
                "exposure": {
                    "route": { "enabled": true }
                },
                "persistence": {
                    "persistentVolumeClaim": { "claimName": "stackrox-db" }
                }
            },
            "egress": { "connectivityPolicy": "Online" },
            "scanner": {
                "analyzer": {
                    "scaling": {
                        "autoScaling": "Enabled",
                        "maxReplicas": 5,
                        "minReplicas": 2,
                        "replicas": 3
                    }
                },
                "scannerComponent": "Enabled"
            }
        }
    })
}

/// Install the operator and Central, then record how to reach it
#[instrument(skip_all, fields(central = %settings.acs.central_name))]
pub async fn install_central(
    client: &Client,
    settings: &Settings,
    store: &StateStore,
) -> Result<CentralEndpoint> {
    let acs = &settings.acs;
    let waits = &settings.waits;

    install_operator(client, &acs.operator, &waits.standard()).await?;
    wait_for_crd(client, CENTRAL_CRD, &waits.standard()).await?;

    ensure_namespace_exists(client, &acs.namespace).await?;
    apply_object(client, &central_manifest(acs)).await?;
    info!("Central {} applied", acs.central_name);

    wait_for_resource(
        client,
        &central_ref(acs),
        &FieldProbe::condition(DEPLOYED_CONDITION),
        "True",
        &waits.long(),
    )
    .await?;

    let host = wait_for_route_termination(
        client,
        &acs.namespace,
        CENTRAL_ROUTE,
        PASSTHROUGH,
        &waits.standard(),
    )
    .await?;

    let password =
        read_secret_value(client, &acs.namespace, HTPASSWD_SECRET, HTPASSWD_PASSWORD_KEY).await?;

    let endpoint = CentralEndpoint {
        address: format!("{}:443", host),
        username: ADMIN_USER.to_string(),
        password,
    };

    store.update(|state| {
        state.rox_central_address = Some(endpoint.address.clone());
        state.acs_portal_username = Some(endpoint.username.clone());
        state.acs_portal_password = Some(endpoint.password.clone());
    })?;

    info!("Central is available at https://{}", host);
    Ok(endpoint)
}
