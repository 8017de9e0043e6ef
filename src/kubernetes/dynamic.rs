// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Untyped access to the custom resources owned by external operators.
//!
//! Central, Securesign, Keycloak and friends have schemas we do not own, so
//! they are built as JSON and applied through `DynamicObject`.

use crate::constants::FIELD_MANAGER;
use crate::error::{Result, SetupError};
use crate::kubernetes::diagnostics;
use crate::kubernetes::status::{observe, FieldProbe};
use crate::wait::{wait_for, WaitOptions, WaitReport};
use kube::{
    api::{ApiResource, DynamicObject, GroupVersionKind, Patch, PatchParams},
    Api, Client,
};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, instrument};

/// Split an `apiVersion` into group and version
pub fn parse_gvk(api_version: &str, kind: &str) -> GroupVersionKind {
    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    };

    GroupVersionKind {
        group,
        version,
        kind: kind.to_string(),
    }
}

/// Points at one object of any kind
#[derive(Debug, Clone)]
pub struct ResourceRef {
    pub resource: ApiResource,
    pub name: String,
    pub namespace: Option<String>,
}

impl ResourceRef {
    pub fn new(api_version: &str, kind: &str, name: &str, namespace: Option<&str>) -> Self {
        Self {
            resource: ApiResource::from_gvk(&parse_gvk(api_version, kind)),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        }
    }

    pub fn namespaced(api_version: &str, kind: &str, name: &str, namespace: &str) -> Self {
        Self::new(api_version, kind, name, Some(namespace))
    }

    /// Build a reference from an object's `apiVersion`, `kind` and metadata
    pub fn from_object(object: &Value) -> Result<Self> {
        let field = |pointer: &str| {
            object.pointer(pointer).and_then(Value::as_str).ok_or_else(|| {
                SetupError::InvalidManifest(format!("missing {} in {}", pointer, summarize(object)))
            })
        };

        let api_version = field("/apiVersion")?;
        let kind = field("/kind")?;
        let name = field("/metadata/name")?;
        let namespace = object.pointer("/metadata/namespace").and_then(Value::as_str);

        Ok(Self::new(api_version, kind, name, namespace))
    }

    pub fn api(&self, client: &Client) -> Api<DynamicObject> {
        api_for(client, &self.resource, self.namespace.as_deref())
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.resource.kind, ns, self.name),
            None => write!(f, "{} {}", self.resource.kind, self.name),
        }
    }
}

fn summarize(object: &Value) -> String {
    object.to_string().chars().take(120).collect()
}

pub fn api_for(
    client: &Client,
    resource: &ApiResource,
    namespace: Option<&str>,
) -> Api<DynamicObject> {
    match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, resource),
        None => Api::all_with(client.clone(), resource),
    }
}

/// Create or update an object with server-side apply
#[instrument(skip(client, object))]
pub async fn apply_object(client: &Client, object: &Value) -> Result<DynamicObject> {
    let target = ResourceRef::from_object(object)?;
    let params = PatchParams::apply(FIELD_MANAGER).force();

    let applied = target
        .api(client)
        .patch(&target.name, &params, &Patch::Apply(object))
        .await?;

    debug!("Applied {}", target);
    Ok(applied)
}

/// Merge-patch an existing object
pub async fn merge_patch(
    client: &Client,
    target: &ResourceRef,
    patch: &Value,
) -> Result<DynamicObject> {
    let patched = target
        .api(client)
        .patch(&target.name, &PatchParams::default(), &Patch::Merge(patch))
        .await?;

    debug!("Patched {}", target);
    Ok(patched)
}

/// Fetch an object as JSON, `None` when it does not exist
pub async fn get_object(client: &Client, target: &ResourceRef) -> Result<Option<Value>> {
    match target.api(client).get_opt(&target.name).await? {
        Some(object) => Ok(Some(serde_json::to_value(object)?)),
        None => Ok(None),
    }
}

/// Split a multi-document YAML stream into JSON objects, skipping empty documents
pub fn split_manifests(yaml: &str) -> Result<Vec<Value>> {
    let mut objects = Vec::new();

    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = Value::deserialize(document)?;
        match value {
            Value::Null => continue,
            Value::Object(_) => objects.push(value),
            other => {
                return Err(SetupError::InvalidManifest(format!(
                    "expected a mapping, got {}",
                    summarize(&other)
                )))
            }
        }
    }

    Ok(objects)
}

/// Wait until the probed field of a resource satisfies `ready`.
///
/// On timeout the resource is dumped to the log before the error is returned.
pub async fn wait_for_resource_with<P>(
    client: &Client,
    target: &ResourceRef,
    probe: &FieldProbe,
    options: &WaitOptions,
    ready: P,
) -> Result<WaitReport<String>>
where
    P: FnMut(&String) -> bool,
{
    let result = wait_for(
        &format!("{} {}", target, probe),
        options,
        || async move { Ok(get_object(client, target).await?.and_then(|o| observe(&o, probe))) },
        ready,
    )
    .await;

    if result.as_ref().is_err_and(SetupError::is_timeout) {
        error!("{} did not become ready", target);
        diagnostics::dump(client, std::slice::from_ref(target)).await;
    }
    result
}

/// Wait until the probed field of a resource equals `expected`
pub async fn wait_for_resource(
    client: &Client,
    target: &ResourceRef,
    probe: &FieldProbe,
    expected: &str,
    options: &WaitOptions,
) -> Result<WaitReport<String>> {
    wait_for_resource_with(client, target, probe, options, |value| value == expected).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{object_json, MockService};
    use serde_json::json;

    const CENTRAL_PATH: &str =
        "/apis/platform.stackrox.io/v1alpha1/namespaces/stackrox/centrals/rhacs-central-services";

    fn central_ref() -> ResourceRef {
        ResourceRef::namespaced(
            "platform.stackrox.io/v1alpha1",
            "Central",
            "rhacs-central-services",
            "stackrox",
        )
    }

    fn central_with_deployed(status: &str) -> String {
        object_json(
            "platform.stackrox.io/v1alpha1",
            "Central",
            "rhacs-central-services",
            "stackrox",
            json!({ "conditions": [{ "type": "Deployed", "status": status }] }),
        )
    }

    #[test]
    fn test_parse_gvk_with_group() {
        let gvk = parse_gvk("platform.stackrox.io/v1alpha1", "Central");
        assert_eq!(gvk.group, "platform.stackrox.io");
        assert_eq!(gvk.version, "v1alpha1");
        assert_eq!(gvk.kind, "Central");
    }

    #[test]
    fn test_parse_gvk_core() {
        let gvk = parse_gvk("v1", "Secret");
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
    }

    #[test]
    fn test_resource_ref_plural_and_display() {
        let target = central_ref();
        assert_eq!(target.resource.plural, "centrals");
        assert_eq!(target.to_string(), "Central stackrox/rhacs-central-services");
    }

    #[test]
    fn test_resource_ref_from_object_requires_name() {
        let err =
            ResourceRef::from_object(&json!({ "apiVersion": "v1", "kind": "Secret" })).unwrap_err();
        assert!(matches!(err, SetupError::InvalidManifest(_)));
    }

    #[test]
    fn test_resource_ref_from_object_with_non_ascii_labels() {
        let object = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "labels": { "team": format!("x{}", "é".repeat(80)) } }
        });

        let err = ResourceRef::from_object(&object).unwrap_err();

        assert!(matches!(err, SetupError::InvalidManifest(_)));
        assert!(err.to_string().contains("/metadata/name"));
    }

    #[test]
    fn test_split_manifests_rejects_non_ascii_sequence() {
        let yaml = format!("- {}\n", "ü".repeat(100));
        let err = split_manifests(&yaml).unwrap_err();
        assert!(matches!(err, SetupError::InvalidManifest(_)));
    }

    #[test]
    fn test_split_manifests_skips_empty_documents() {
        let yaml = r#"
---
apiVersion: v1
kind: Secret
metadata:
  name: a
---
---
apiVersion: v1
kind: Secret
metadata:
  name: b
"#;
        let objects = split_manifests(yaml).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1]["metadata"]["name"], "b");
    }

    #[test]
    fn test_split_manifests_rejects_scalars() {
        assert!(split_manifests("just a string").is_err());
    }

    #[tokio::test]
    async fn test_apply_object_uses_server_side_apply() {
        let mock = MockService::new().on_patch(CENTRAL_PATH, 200, &central_with_deployed("False"));
        let central = json!({
            "apiVersion": "platform.stackrox.io/v1alpha1",
            "kind": "Central",
            "metadata": { "name": "rhacs-central-services", "namespace": "stackrox" },
            "spec": {}
        });

        apply_object(&mock.client(), &central).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert_eq!(requests[0].body.as_ref().unwrap()["kind"], "Central");
    }

    #[tokio::test]
    async fn test_get_object_missing_is_none() {
        let client = MockService::new().into_client();
        assert!(get_object(&client, &central_ref()).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resource_condition() {
        let client = MockService::new()
            .on_get_sequence(
                CENTRAL_PATH,
                vec![
                    (404, crate::test_utils::not_found_json("centrals", "rhacs-central-services")),
                    (200, central_with_deployed("False")),
                    (200, central_with_deployed("False")),
                    (200, central_with_deployed("True")),
                ],
            )
            .into_client();

        let report = wait_for_resource(
            &client,
            &central_ref(),
            &FieldProbe::condition("Deployed"),
            "True",
            &WaitOptions::from_secs(5, 60),
        )
        .await
        .unwrap();

        assert_eq!(report.polls, 4);
        assert_eq!(report.value, "True");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resource_times_out() {
        let client = MockService::new()
            .on_get(CENTRAL_PATH, 200, &central_with_deployed("False"))
            .into_client();

        let err = wait_for_resource(
            &client,
            &central_ref(),
            &FieldProbe::condition("Deployed"),
            "True",
            &WaitOptions::from_secs(5, 30),
        )
        .await
        .unwrap_err();

        match err {
            SetupError::Timeout { last_observed, .. } => {
                assert_eq!(last_observed.as_deref(), Some("\"False\""))
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resource_timeout_dumps_resource() {
        let mock = MockService::new().on_get(CENTRAL_PATH, 200, &central_with_deployed("False"));

        let err = wait_for_resource(
            &mock.client(),
            &central_ref(),
            &FieldProbe::condition("Deployed"),
            "True",
            &WaitOptions::from_secs(5, 30),
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        let gets = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == "GET" && r.path == CENTRAL_PATH)
            .count();
        // polls at 0, 5, ..., 30 and one more fetch for the dump
        assert_eq!(gets, 8);
    }

    #[tokio::test]
    async fn test_wait_for_resource_success_skips_dump() {
        let mock = MockService::new().on_get(CENTRAL_PATH, 200, &central_with_deployed("True"));

        wait_for_resource(
            &mock.client(),
            &central_ref(),
            &FieldProbe::condition("Deployed"),
            "True",
            &WaitOptions::from_secs(5, 30),
        )
        .await
        .unwrap();

        assert_eq!(mock.requests().len(), 1);
    }
}
