// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dump resources to the log when a step fails

use crate::kubernetes::dynamic::{api_for, get_object, ResourceRef};
use kube::api::{ApiResource, ListParams};
use kube::Client;
use serde_json::Value;
use tracing::{error, warn};

fn to_yaml(object: &Value) -> String {
    serde_yaml::to_string(object).unwrap_or_else(|_| object.to_string())
}

/// Drop noisy metadata before printing
fn strip_managed_fields(mut object: Value) -> Value {
    if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.remove("managedFields");
    }
    object
}

/// Log the YAML of each resource. Lookup failures are logged, never returned.
pub async fn dump(client: &Client, targets: &[ResourceRef]) {
    for target in targets {
        match get_object(client, target).await {
            Ok(Some(object)) => {
                error!("{}:\n{}", target, to_yaml(&strip_managed_fields(object)))
            }
            Ok(None) => error!("{}: not found", target),
            Err(e) => warn!("Could not fetch {} for diagnostics: {}", target, e),
        }
    }
}

/// Log the YAML of every object of a kind in a namespace
pub async fn dump_all(client: &Client, resource: &ApiResource, namespace: &str) {
    match api_for(client, resource, Some(namespace))
        .list(&ListParams::default())
        .await
    {
        Ok(list) if list.items.is_empty() => {
            error!("No {} objects in namespace {}", resource.kind, namespace)
        }
        Ok(list) => {
            for item in list.items {
                let value = serde_json::to_value(item).unwrap_or_default();
                error!(
                    "{} {}:\n{}",
                    resource.kind,
                    namespace,
                    to_yaml(&strip_managed_fields(value))
                );
            }
        }
        Err(e) => warn!(
            "Could not list {} in {} for diagnostics: {}",
            resource.kind, namespace, e
        ),
    }
}
