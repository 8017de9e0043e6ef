// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! REST client for RHACS Central

use crate::config::HttpSettings;
use crate::error::{Result, SetupError};
use crate::rest::{base_url, http_client, send};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

/// How to authenticate against Central
#[derive(Clone)]
pub enum Auth {
    Basic { username: String, password: String },
    Bearer(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Basic { username, .. } => write!(f, "Basic({}, ***)", username),
            Auth::Bearer(_) => write!(f, "Bearer(***)"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub health_status: Option<HealthStatus>,
}

impl ClusterSummary {
    pub fn overall_health(&self) -> Option<&str> {
        self.health_status
            .as_ref()
            .and_then(|h| h.overall_health_status.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    #[serde(default)]
    pub overall_health_status: Option<String>,
}

/// A freshly generated init bundle; the bundles are base64 encoded YAML
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBundle {
    #[serde(default)]
    pub kubectl_bundle: String,
    #[serde(default)]
    pub helm_values_bundle: String,
}

#[derive(Debug, Deserialize)]
struct ClusterList {
    #[serde(default)]
    clusters: Vec<ClusterSummary>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct InitBundleList {
    #[serde(default)]
    items: Vec<NamedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanConfigurationSummary {
    #[serde(default)]
    scan_name: String,
}

#[derive(Debug, Deserialize)]
struct ScanConfigurationList {
    #[serde(default)]
    configurations: Vec<ScanConfigurationSummary>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    name: &'a str,
    roles: Vec<&'a str>,
}

#[derive(Debug, Clone)]
pub struct AcsClient {
    http: Client,
    base: Url,
    auth: Auth,
}

impl AcsClient {
    pub fn new(endpoint: &str, auth: Auth, settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings)?,
            base: base_url(endpoint)?,
            auth,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| SetupError::ConfigError(format!("invalid path '{}': {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", path);
        let request = self.authorize(self.http.get(self.url(path)?));
        Ok(send(request).await?.json().await?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", path);
        let request = self.authorize(self.http.post(self.url(path)?).json(body));
        Ok(send(request).await?.json().await?)
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        debug!("PUT {}", path);
        let request = self.authorize(self.http.put(self.url(path)?).json(body));
        send(request).await?;
        Ok(())
    }

    /// Generate an API token with the given role
    #[instrument(skip(self))]
    pub async fn generate_api_token(&self, name: &str, role: &str) -> Result<String> {
        let response: TokenResponse = self
            .post(
                "/v1/apitokens/generate",
                &TokenRequest {
                    name,
                    roles: vec![role],
                },
            )
            .await?;
        Ok(response.token)
    }

    pub async fn clusters(&self) -> Result<Vec<ClusterSummary>> {
        let list: ClusterList = self.get("/v1/clusters").await?;
        Ok(list.clusters)
    }

    pub async fn init_bundle_names(&self) -> Result<Vec<String>> {
        let list: InitBundleList = self.get("/v1/cluster-init/init-bundles").await?;
        Ok(list.items.into_iter().map(|i| i.name).collect())
    }

    #[instrument(skip(self))]
    pub async fn generate_init_bundle(&self, name: &str) -> Result<InitBundle> {
        self.post("/v1/cluster-init/init-bundles", &json!({ "name": name }))
            .await
    }

    pub async fn get_config(&self) -> Result<Value> {
        self.get("/v1/config").await
    }

    pub async fn put_config(&self, config: &Value) -> Result<()> {
        self.put("/v1/config", &json!({ "config": config })).await
    }

    pub async fn scan_configuration_names(&self) -> Result<Vec<String>> {
        let list: ScanConfigurationList = self.get("/v2/compliance/scan/configurations").await?;
        Ok(list.configurations.into_iter().map(|c| c.scan_name).collect())
    }

    pub async fn create_scan_configuration(&self, body: &Value) -> Result<Value> {
        self.post("/v2/compliance/scan/configurations", body).await
    }
}
