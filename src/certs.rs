// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! cert-manager, a cluster issuer and a trusted certificate for Central

use crate::acs::central::central_ref;
use crate::config::{CertSettings, Settings};
use crate::constants::acs::CENTRAL_ROUTE;
use crate::error::Result;
use crate::kubernetes::{
    apply_object, merge_patch, route_host, wait_for_crd, wait_for_resource, FieldProbe, ResourceRef,
};
use crate::olm::install_operator;
use kube::Client;
use serde_json::{json, Value};
use tracing::{info, instrument};

pub const CERT_MANAGER_API_VERSION: &str = "cert-manager.io/v1";
pub const CERTIFICATE_CRD: &str = "certificates.cert-manager.io";

/// ACME issuer when an account email is configured, self-signed otherwise
pub fn cluster_issuer_manifest(settings: &CertSettings) -> Value {
    let spec = match &settings.acme_email {
        Some(email) => json!({
            "acme": {
                "email": email,
                "server": settings.acme_server,
                "privateKeySecretRef": { "name": format!("{}-account-key", settings.issuer_name) },
                "solvers": [{
                    "http01": { "ingress": { "ingressClassName": "openshift-default" } }
                }]
            }
        }),
        None => json!({ "selfSigned": {} }),
    };

    json!({
        "apiVersion": CERT_MANAGER_API_VERSION,
        "kind": "ClusterIssuer",
        "metadata": { "name": settings.issuer_name },
        "spec": spec
    })
}

pub fn certificate_manifest(settings: &CertSettings, namespace: &str, host: &str) -> Value {
    json!({
        "apiVersion": CERT_MANAGER_API_VERSION,
        "kind": "Certificate",
        "metadata": {
            "name": settings.certificate_name,
            "namespace": namespace
        },
        "spec": {
            "secretName": settings.secret_name,
            "commonName": host,
            "dnsNames": [host],
            "issuerRef": {
                "name": settings.issuer_name,
                "kind": "ClusterIssuer"
            }
        }
    })
}

/// Install the operator and the cluster issuer
#[instrument(skip_all)]
pub async fn install_cert_manager(client: &Client, settings: &Settings) -> Result<()> {
    let certs = &settings.certs;
    let waits = &settings.waits;

    install_operator(client, &certs.operator, &waits.standard()).await?;
    wait_for_crd(client, CERTIFICATE_CRD, &waits.standard()).await?;

    let issuer = cluster_issuer_manifest(certs);
    apply_object(client, &issuer).await?;
    wait_for_resource(
        client,
        &ResourceRef::from_object(&issuer)?,
        &FieldProbe::condition("Ready"),
        "True",
        &waits.standard(),
    )
    .await?;

    info!("ClusterIssuer {} is ready", certs.issuer_name);
    Ok(())
}

/// Issue a certificate for the Central route and make Central serve it
#[instrument(skip_all)]
pub async fn secure_central(client: &Client, settings: &Settings) -> Result<()> {
    let certs = &settings.certs;
    let namespace = &settings.acs.namespace;

    let host = route_host(client, namespace, CENTRAL_ROUTE).await?;
    let certificate = certificate_manifest(certs, namespace, &host);
    apply_object(client, &certificate).await?;
    wait_for_resource(
        client,
        &ResourceRef::from_object(&certificate)?,
        &FieldProbe::condition("Ready"),
        "True",
        &settings.waits.standard(),
    )
    .await?;

    merge_patch(
        client,
        &central_ref(&settings.acs),
        &json!({ "spec": { "central": { "defaultTLSSecret": { "name": certs.secret_name } } } }),
    )
    .await?;

    info!("Central serves certificate {} for {}", certs.secret_name, host);
    Ok(())
}

/// Both halves, for running the step on its own
pub async fn install_certs(client: &Client, settings: &Settings) -> Result<()> {
    install_cert_manager(client, settings).await?;
    secure_central(client, settings).await
}
