// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "route.openshift.io", version = "v1", kind = "Route")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouteTls>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTls {
    pub termination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_edge_termination_policy: Option<String>,
}

impl Route {
    pub fn host(&self) -> Option<&str> {
        self.spec.host.as_deref().filter(|h| !h.is_empty())
    }

    /// TLS termination mode (edge, passthrough or reencrypt)
    pub fn termination(&self) -> Option<&str> {
        self.spec.tls.as_ref().map(|t| t.termination.as_str())
    }

    pub fn https_url(&self) -> Option<String> {
        self.host().map(|h| format!("https://{}", h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_route(value: serde_json::Value) -> Route {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_passthrough_route() {
        let route = make_route(serde_json::json!({
            "apiVersion": "route.openshift.io/v1",
            "kind": "Route",
            "metadata": { "name": "central", "namespace": "stackrox" },
            "spec": {
                "host": "central-stackrox.apps.example.com",
                "tls": { "termination": "passthrough" },
                "to": { "kind": "Service", "name": "central" }
            }
        }));

        assert_eq!(route.termination(), Some("passthrough"));
        assert_eq!(route.host(), Some("central-stackrox.apps.example.com"));
        assert_eq!(
            route.https_url().as_deref(),
            Some("https://central-stackrox.apps.example.com")
        );
    }

    #[test]
    fn test_route_without_tls_or_host() {
        let route = make_route(serde_json::json!({
            "apiVersion": "route.openshift.io/v1",
            "kind": "Route",
            "metadata": { "name": "plain" },
            "spec": { "host": "" }
        }));

        assert_eq!(route.termination(), None);
        assert_eq!(route.host(), None);
    }
}
