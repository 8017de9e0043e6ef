// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Red Hat Single Sign-On (Keycloak) with a realm, an OIDC client and a user
//! for Trusted Artifact Signer.

use crate::config::{HttpSettings, KeycloakSettings, Settings};
use crate::error::{Result, SetupError};
use crate::kubernetes::{
    apply_object, ensure_namespace_exists, read_secret_value, route_host, wait_for_crd,
    wait_for_resource, FieldProbe, ResourceRef,
};
use crate::olm::install_operator;
use crate::rest::{base_url, http_client, send};
use crate::state::StateStore;
use crate::wait::FailurePolicy;
use kube::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use url::Url;

pub const KEYCLOAK_API_VERSION: &str = "keycloak.org/v1alpha1";
pub const KEYCLOAK_CRD: &str = "keycloaks.keycloak.org";
const KEYCLOAK_ROUTE: &str = "keycloak";

/// State keys written by this module
pub mod keys {
    pub const KEYCLOAK_URL: &str = "KEYCLOAK_URL";
    pub const KEYCLOAK_REALM: &str = "KEYCLOAK_REALM";
    pub const OIDC_ISSUER_URL: &str = "OIDC_ISSUER_URL";
    pub const OIDC_CLIENT_ID: &str = "OIDC_CLIENT_ID";
}

fn instance_labels() -> Value {
    json!({ "app": "sso" })
}

pub fn keycloak_manifest(settings: &KeycloakSettings) -> Value {
    json!({
        "apiVersion": KEYCLOAK_API_VERSION,
        "kind": "Keycloak",
        "metadata": {
            "name": settings.name,
            "namespace": settings.operator.namespace,
            "labels": instance_labels()
        },
        "spec": {
            "externalAccess": { "enabled": true },
            "instances": 1
        }
    })
}

pub fn realm_manifest(settings: &KeycloakSettings) -> Value {
    json!({
        "apiVersion": KEYCLOAK_API_VERSION,
        "kind": "KeycloakRealm",
        "metadata": {
            "name": format!("{}-realm", settings.realm),
            "namespace": settings.operator.namespace,
            "labels": instance_labels()
        },
        "spec": {
            "instanceSelector": { "matchLabels": instance_labels() },
            "realm": {
                "id": settings.realm,
                "realm": settings.realm,
                "displayName": settings.realm,
                "enabled": true
            }
        }
    })
}

pub fn client_manifest(settings: &KeycloakSettings) -> Value {
    json!({
        "apiVersion": KEYCLOAK_API_VERSION,
        "kind": "KeycloakClient",
        "metadata": {
            "name": settings.client_id,
            "namespace": settings.operator.namespace,
            "labels": instance_labels()
        },
        "spec": {
            "realmSelector": { "matchLabels": instance_labels() },
            "client": {
                "clientId": settings.client_id,
                "protocol": "openid-connect",
                "publicClient": true,
                "standardFlowEnabled": true,
                "directAccessGrantsEnabled": true,
                "implicitFlowEnabled": false,
                "redirectUris": ["*"],
                "webOrigins": ["+"],
                "defaultClientScopes": ["profile", "email"]
            }
        }
    })
}

pub fn user_manifest(settings: &KeycloakSettings) -> Value {
    let user = &settings.user;
    json!({
        "apiVersion": KEYCLOAK_API_VERSION,
        "kind": "KeycloakUser",
        "metadata": {
            "name": user.username,
            "namespace": settings.operator.namespace,
            "labels": instance_labels()
        },
        "spec": {
            "realmSelector": { "matchLabels": instance_labels() },
            "user": {
                "username": user.username,
                "email": user.email,
                "emailVerified": true,
                "enabled": true,
                "firstName": user.first_name,
                "lastName": user.last_name,
                "credentials": [{ "type": "password", "value": user.password, "temporary": false }]
            }
        }
    })
}

/// Issuer URL of a realm served from `base`
pub fn issuer_url(base: &Url, realm: &str) -> String {
    format!(
        "{}/auth/realms/{}",
        base.as_str().trim_end_matches('/'),
        realm
    )
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Minimal Keycloak admin REST client
#[derive(Debug, Clone)]
pub struct KeycloakApi {
    http: reqwest::Client,
    base: Url,
}

impl KeycloakApi {
    pub fn new(endpoint: &str, settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings)?,
            base: base_url(endpoint)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| SetupError::ConfigError(format!("invalid path '{}': {}", path, e)))
    }

    /// Password grant against the master realm with the admin-cli client
    #[instrument(skip(self, password))]
    pub async fn admin_token(&self, username: &str, password: &str) -> Result<String> {
        let form = [
            ("grant_type", "password"),
            ("client_id", "admin-cli"),
            ("username", username),
            ("password", password),
        ];
        let request = self
            .http
            .post(self.url("/auth/realms/master/protocol/openid-connect/token")?)
            .form(&form);

        let token: TokenResponse = send(request).await?.json().await?;
        Ok(token.access_token)
    }

    pub async fn realm_exists(&self, token: &str, realm: &str) -> Result<bool> {
        let request = self
            .http
            .get(self.url(&format!("/auth/admin/realms/{}", realm))?)
            .bearer_auth(token);

        match send(request).await {
            Ok(_) => Ok(true),
            Err(SetupError::ApiError { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

async fn verify_realm(client: &Client, settings: &Settings, base: &Url) -> Result<()> {
    let keycloak = &settings.keycloak;
    let secret = format!("credential-{}", keycloak.name);
    let namespace = &keycloak.operator.namespace;

    let username = read_secret_value(client, namespace, &secret, "ADMIN_USERNAME").await?;
    let password = read_secret_value(client, namespace, &secret, "ADMIN_PASSWORD").await?;

    let api = KeycloakApi::new(base.as_str(), &settings.http)?;
    let token = api.admin_token(&username, &password).await?;
    if !api.realm_exists(&token, &keycloak.realm).await? {
        return Err(SetupError::NotFound(format!("Keycloak realm {}", keycloak.realm)));
    }
    info!("Realm {} is served by Keycloak", keycloak.realm);
    Ok(())
}

/// Install RH-SSO and provision the realm, client and user. Returns the issuer URL.
#[instrument(skip_all, fields(keycloak = %settings.keycloak.name))]
pub async fn install_keycloak(
    client: &Client,
    settings: &Settings,
    store: &StateStore,
) -> Result<String> {
    let keycloak = &settings.keycloak;
    let namespace = &keycloak.operator.namespace;
    let waits = &settings.waits;
    let ready = FieldProbe::pointer("/status/ready");

    install_operator(client, &keycloak.operator, &waits.standard()).await?;
    wait_for_crd(client, KEYCLOAK_CRD, &waits.standard()).await?;
    ensure_namespace_exists(client, namespace).await?;

    let instance = keycloak_manifest(keycloak);
    apply_object(client, &instance).await?;
    let target = ResourceRef::from_object(&instance)?;
    wait_for_resource(client, &target, &ready, "true", &waits.long()).await?;

    let realm = realm_manifest(keycloak);
    apply_object(client, &realm).await?;
    let target = ResourceRef::from_object(&realm)?;
    wait_for_resource(client, &target, &ready, "true", &waits.standard()).await?;

    apply_object(client, &client_manifest(keycloak)).await?;
    apply_object(client, &user_manifest(keycloak)).await?;

    let base = base_url(&route_host(client, namespace, KEYCLOAK_ROUTE).await?)?;
    FailurePolicy::Warn.apply(verify_realm(client, settings, &base).await)?;

    let issuer = issuer_url(&base, &keycloak.realm);
    store.update(|state| {
        state.set_extra(keys::KEYCLOAK_URL, base.as_str().trim_end_matches('/'));
        state.set_extra(keys::KEYCLOAK_REALM, keycloak.realm.clone());
        state.set_extra(keys::OIDC_ISSUER_URL, issuer.clone());
        state.set_extra(keys::OIDC_CLIENT_ID, keycloak.client_id.clone());
    })?;

    info!("Keycloak realm issuer is {}", issuer);
    Ok(issuer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keycloak_manifest() {
        let manifest = keycloak_manifest(&KeycloakSettings::default());

        assert_eq!(manifest["metadata"]["namespace"], "rhsso");
        assert_eq!(manifest["metadata"]["labels"]["app"], "sso");
        assert_eq!(manifest["spec"]["externalAccess"]["enabled"], true);
    }

    #[test]
    fn test_realm_and_client_select_instance_labels() {
        let settings = KeycloakSettings::default();

        let realm = realm_manifest(&settings);
        assert_eq!(realm["spec"]["instanceSelector"]["matchLabels"]["app"], "sso");
        assert_eq!(realm["spec"]["realm"]["realm"], "openshift");

        let client = client_manifest(&settings);
        assert_eq!(client["spec"]["realmSelector"]["matchLabels"]["app"], "sso");
        assert_eq!(client["spec"]["client"]["clientId"], "trusted-artifact-signer");
        assert_eq!(client["spec"]["client"]["publicClient"], true);
    }

    #[test]
    fn test_user_manifest_has_password_credential() {
        let user = user_manifest(&KeycloakSettings::default());

        assert_eq!(user["spec"]["user"]["emailVerified"], true);
        assert_eq!(user["spec"]["user"]["credentials"][0]["type"], "password");
        assert_eq!(user["spec"]["user"]["credentials"][0]["value"], "secure");
    }

    #[test]
    fn test_issuer_url() {
        let base = base_url("keycloak-rhsso.apps.example.com").unwrap();
        assert_eq!(
            issuer_url(&base, "openshift"),
            "https://keycloak-rhsso.apps.example.com/auth/realms/openshift"
        );
    }
}
