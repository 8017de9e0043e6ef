// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OpenShift route lookups

use crate::error::{Result, SetupError};
use crate::types::Route;
use crate::wait::{wait_for, WaitOptions};
use kube::{Api, Client};

/// Wait until a route exists with the given TLS termination, returning its host
pub async fn wait_for_route_termination(
    client: &Client,
    namespace: &str,
    name: &str,
    termination: &str,
    options: &WaitOptions,
) -> Result<String> {
    let routes: Api<Route> = Api::namespaced(client.clone(), namespace);
    let routes = &routes;

    let report = wait_for(
        &format!("Route {}/{} with {} termination", namespace, name, termination),
        options,
        || async move {
            let route = routes.get_opt(name).await?;
            Ok(route.and_then(|r| {
                let host = r.host()?.to_string();
                Some((r.termination().unwrap_or_default().to_string(), host))
            }))
        },
        |(observed, _): &(String, String)| observed == termination,
    )
    .await?;

    Ok(report.value.1)
}

/// Read the host of a route, failing when it has none
pub async fn route_host(client: &Client, namespace: &str, name: &str) -> Result<String> {
    let routes: Api<Route> = Api::namespaced(client.clone(), namespace);
    let route = routes
        .get_opt(name)
        .await?
        .ok_or_else(|| SetupError::NotFound(format!("route {}/{}", namespace, name)))?;

    route
        .host()
        .map(str::to_string)
        .ok_or_else(|| SetupError::NotFound(format!("host of route {}/{}", namespace, name)))
}

/// `https://<host>` of a route
pub async fn route_url(client: &Client, namespace: &str, name: &str) -> Result<String> {
    let routes: Api<Route> = Api::namespaced(client.clone(), namespace);
    routes
        .get_opt(name)
        .await?
        .and_then(|route| route.https_url())
        .ok_or_else(|| SetupError::NotFound(format!("host of route {}/{}", namespace, name)))
}
