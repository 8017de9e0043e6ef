// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Red Hat Trusted Artifact Signer (Securesign) and the cosign environment
//! needed to sign against it.

use crate::config::{OidcProviderKind, RhtasSettings, Settings};
use crate::error::{Result, SetupError};
use crate::keycloak::{self, issuer_url};
use crate::kubernetes::{
    apply_object, ensure_namespace_exists, route_host, route_url, wait_for_crd, wait_for_resource,
    FieldProbe, ResourceRef,
};
use crate::olm::install_operator;
use crate::rest::base_url;
use crate::state::{SessionState, StateStore};
use crate::wait::FailurePolicy;
use kube::Client;
use serde_json::{json, Value};
use tracing::{info, instrument};

pub const SECURESIGN_API_VERSION: &str = "rhtas.redhat.com/v1alpha1";
pub const SECURESIGN_CRD: &str = "securesigns.rhtas.redhat.com";

const OAUTH_NAMESPACE: &str = "openshift-authentication";
const OAUTH_ROUTE: &str = "oauth-openshift";
const KEYCLOAK_ROUTE: &str = "keycloak";

/// Route names created by the operator for a Securesign instance
pub mod routes {
    pub const FULCIO: &str = "fulcio-server";
    pub const REKOR: &str = "rekor-server";
    pub const TUF: &str = "tuf";
    pub const REKOR_SEARCH: &str = "rekor-search";
}

/// Which identity provider Fulcio trusts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OidcProvider {
    Keycloak { realm: String, client_id: String },
    OpenShiftOAuth { client_id: String },
}

impl OidcProvider {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.rhtas.oidc_provider {
            OidcProviderKind::Keycloak => OidcProvider::Keycloak {
                realm: settings.keycloak.realm.clone(),
                client_id: settings.keycloak.client_id.clone(),
            },
            OidcProviderKind::OpenshiftOauth => OidcProvider::OpenShiftOAuth {
                client_id: settings.rhtas.oauth_client_id.clone(),
            },
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            OidcProvider::Keycloak { client_id, .. } => client_id,
            OidcProvider::OpenShiftOAuth { client_id } => client_id,
        }
    }

    /// Issuer URL of the provider.
    ///
    /// A Keycloak issuer recorded by an earlier run is reused; otherwise it is
    /// derived from the provider's route.
    #[instrument(skip_all, fields(provider = ?self))]
    pub async fn issuer(
        &self,
        client: &Client,
        settings: &Settings,
        state: &SessionState,
    ) -> Result<String> {
        match self {
            OidcProvider::Keycloak { realm, .. } => {
                if let Some(issuer) = state.extra(keycloak::keys::OIDC_ISSUER_URL) {
                    return Ok(issuer.to_string());
                }
                let namespace = &settings.keycloak.operator.namespace;
                let host = route_host(client, namespace, KEYCLOAK_ROUTE).await?;
                Ok(issuer_url(&base_url(&host)?, realm))
            }
            OidcProvider::OpenShiftOAuth { .. } => {
                route_url(client, OAUTH_NAMESPACE, OAUTH_ROUTE).await
            }
        }
    }
}

pub fn securesign_manifest(settings: &RhtasSettings, issuer: &str, client_id: &str) -> Value {
    json!({
        "apiVersion": SECURESIGN_API_VERSION,
        "kind": "Securesign",
        "metadata": {
            "name": settings.name,
            "namespace": settings.namespace,
            "labels": {
                "app.kubernetes.io/name": settings.name,
                "app.kubernetes.io/instance": settings.name,
                "app.kubernetes.io/part-of": "trusted-artifact-signer"
            }
        },
        "spec": {
            "rekor": {
                "externalAccess": { "enabled": true },
                "rekorSearchUI": { "enabled": true },
                "signer": { "kms": "secret" },
                "pvc": { "retain": true, "size": "5Gi" }
            },
            "trillian": {
                "database": {
                    "create": true,
                    "pvc": { "retain": true, "size": "5Gi" }
                }
            },
            "fulcio": {
                "externalAccess": { "enabled": true },
                "config": {
                    "OIDCIssuers": [{
                        "ClientID": client_id,
                        "Issuer": issuer,
                        "IssuerURL": issuer,
                        "Type": "email"
                    }]
                },
                "certificate": {
                    "organizationName": settings.organization_name,
                    "organizationEmail": settings.organization_email,
                    "commonName": settings.common_name
                }
            },
            "tuf": {
                "externalAccess": { "enabled": true },
                "keys": [
                    { "name": "rekor.pub" },
                    { "name": "ctfe.pub" },
                    { "name": "fulcio_v1.crt.pem" }
                ]
            },
            "ctlog": {}
        }
    })
}

/// Public URLs of a running Securesign instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningEndpoints {
    pub fulcio: String,
    pub rekor: String,
    pub tuf: String,
    pub rekor_search: Option<String>,
}

impl SigningEndpoints {
    /// Environment for cosign and the sigstore clients
    pub fn cosign_environment(&self, issuer: &str, client_id: &str) -> Vec<(&'static str, String)> {
        let mut env = vec![
            ("TUF_URL", self.tuf.clone()),
            ("OIDC_ISSUER_URL", issuer.to_string()),
            ("COSIGN_FULCIO_URL", self.fulcio.clone()),
            ("COSIGN_REKOR_URL", self.rekor.clone()),
            ("COSIGN_MIRROR", self.tuf.clone()),
            ("COSIGN_ROOT", format!("{}/root.json", self.tuf)),
            ("COSIGN_OIDC_ISSUER", issuer.to_string()),
            ("COSIGN_OIDC_CLIENT_ID", client_id.to_string()),
            ("COSIGN_CERTIFICATE_OIDC_ISSUER", issuer.to_string()),
            ("COSIGN_YES", "true".to_string()),
            ("SIGSTORE_FULCIO_URL", self.fulcio.clone()),
            ("SIGSTORE_OIDC_ISSUER", issuer.to_string()),
            ("SIGSTORE_REKOR_URL", self.rekor.clone()),
            ("REKOR_REKOR_SERVER", self.rekor.clone()),
        ];
        if let Some(search) = &self.rekor_search {
            env.push(("REKOR_SEARCH_URL", search.clone()));
        }
        env
    }
}

pub async fn signing_endpoints(client: &Client, namespace: &str) -> Result<SigningEndpoints> {
    let rekor_search =
        FailurePolicy::Warn.apply(route_url(client, namespace, routes::REKOR_SEARCH).await)?;

    Ok(SigningEndpoints {
        fulcio: route_url(client, namespace, routes::FULCIO).await?,
        rekor: route_url(client, namespace, routes::REKOR).await?,
        tuf: route_url(client, namespace, routes::TUF).await?,
        rekor_search,
    })
}

/// Install the operator and a Securesign instance trusting the configured
/// OIDC provider, then record the signing environment.
#[instrument(skip_all, fields(securesign = %settings.rhtas.name))]
pub async fn install_rhtas(
    client: &Client,
    settings: &Settings,
    store: &StateStore,
) -> Result<SigningEndpoints> {
    let rhtas = &settings.rhtas;
    let waits = &settings.waits;
    let provider = OidcProvider::from_settings(settings);

    let issuer = provider
        .issuer(client, settings, &store.load()?.with_env_overrides())
        .await
        .map_err(|e| match e {
            SetupError::NotFound(what) => SetupError::NotFound(format!(
                "{} (the OIDC provider must be installed before Trusted Artifact Signer)",
                what
            )),
            other => other,
        })?;
    info!("Fulcio will trust issuer {}", issuer);

    install_operator(client, &rhtas.operator, &waits.standard()).await?;
    wait_for_crd(client, SECURESIGN_CRD, &waits.standard()).await?;
    ensure_namespace_exists(client, &rhtas.namespace).await?;

    let manifest = securesign_manifest(rhtas, &issuer, provider.client_id());
    apply_object(client, &manifest).await?;
    wait_for_resource(
        client,
        &ResourceRef::from_object(&manifest)?,
        &FieldProbe::condition("Ready"),
        "True",
        &waits.long(),
    )
    .await?;

    let endpoints = signing_endpoints(client, &rhtas.namespace).await?;
    let env = endpoints.cosign_environment(&issuer, provider.client_id());
    store.update(|state| {
        for (key, value) in &env {
            state.set_extra(key, value.clone());
        }
    })?;

    info!("Trusted Artifact Signer is ready, TUF at {}", endpoints.tuf);
    Ok(endpoints)
}
