// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OpenShift AI through a DataScienceCluster

use crate::config::{RhoaiSettings, Settings};
use crate::error::Result;
use crate::kubernetes::{apply_object, wait_for_crd, wait_for_resource, FieldProbe, ResourceRef};
use crate::olm::install_operator;
use kube::Client;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};

pub const DSC_API_VERSION: &str = "datasciencecluster.opendatahub.io/v1";
pub const DSC_CRD: &str = "datascienceclusters.datasciencecluster.opendatahub.io";

/// Components a DataScienceCluster knows about
pub const COMPONENTS: &[&str] = &[
    "codeflare",
    "dashboard",
    "datasciencepipelines",
    "kserve",
    "kueue",
    "modelmeshserving",
    "modelregistry",
    "ray",
    "trainingoperator",
    "trustyai",
    "workbenches",
];

fn management_state(settings: &RhoaiSettings, component: &str) -> &'static str {
    if settings.managed_components.iter().any(|c| c == component) {
        "Managed"
    } else {
        "Removed"
    }
}

pub fn data_science_cluster_manifest(settings: &RhoaiSettings) -> Value {
    let mut components = Map::new();
    for component in COMPONENTS {
        components.insert(
            component.to_string(),
            json!({ "managementState": management_state(settings, component) }),
        );
    }

    // Also honour components newer than the list above
    for component in &settings.managed_components {
        components
            .entry(component.clone())
            .or_insert_with(|| json!({ "managementState": "Managed" }));
    }

    json!({
        "apiVersion": DSC_API_VERSION,
        "kind": "DataScienceCluster",
        "metadata": { "name": settings.name },
        "spec": { "components": components }
    })
}

#[instrument(skip_all, fields(dsc = %settings.rhoai.name))]
pub async fn install_rhoai(client: &Client, settings: &Settings) -> Result<()> {
    let rhoai = &settings.rhoai;
    let waits = &settings.waits;

    install_operator(client, &rhoai.operator, &waits.standard()).await?;
    wait_for_crd(client, DSC_CRD, &waits.standard()).await?;

    let manifest = data_science_cluster_manifest(rhoai);
    apply_object(client, &manifest).await?;
    info!(
        "DataScienceCluster {} applied with {} managed components",
        rhoai.name,
        rhoai.managed_components.len()
    );

    wait_for_resource(
        client,
        &ResourceRef::from_object(&manifest)?,
        &FieldProbe::pointer("/status/phase"),
        "Ready",
        &waits.long(),
    )
    .await?;

    info!("OpenShift AI is ready");
    Ok(())
}
