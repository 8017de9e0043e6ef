// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keycloak admin REST calls against a wiremock server

use serde_json::json;
use wiremock::matchers::{bearer_token, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opsetup::config::HttpSettings;
use opsetup::error::SetupError;
use opsetup::keycloak::KeycloakApi;

async fn make_api() -> (MockServer, KeycloakApi) {
    let server = MockServer::start().await;
    let api = KeycloakApi::new(&server.uri(), &HttpSettings::default()).unwrap();
    (server, api)
}

#[tokio::test]
async fn test_admin_token_password_grant() {
    let (server, api) = make_api().await;
    Mock::given(method("POST"))
        .and(path("/auth/realms/master/protocol/openid-connect/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=admin-cli"))
        .and(body_string_contains("username=admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "kc-token",
            "expires_in": 60,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = api.admin_token("admin", "s3cret").await.unwrap();

    assert_eq!(token, "kc-token");
}

#[tokio::test]
async fn test_admin_token_rejected() {
    let (server, api) = make_api().await;
    Mock::given(method("POST"))
        .and(path("/auth/realms/master/protocol/openid-connect/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let err = api.admin_token("admin", "wrong").await.unwrap_err();

    assert!(matches!(err, SetupError::ApiError { .. }));
}

#[tokio::test]
async fn test_realm_exists() {
    let (server, api) = make_api().await;
    Mock::given(method("GET"))
        .and(path("/auth/admin/realms/openshift"))
        .and(bearer_token("kc-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "realm": "openshift" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/admin/realms/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(api.realm_exists("kc-token", "openshift").await.unwrap());
    assert!(!api.realm_exists("kc-token", "missing").await.unwrap());
}
