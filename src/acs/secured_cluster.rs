// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! SecuredCluster installation on one or more clusters

use crate::acs::api::AcsClient;
use crate::acs::central::CENTRAL_API_VERSION;
use crate::config::{ClusterTarget, Settings};
use crate::constants::acs::{DEPLOYED_CONDITION, HEALTHY};
use crate::error::{Result, SetupError};
use crate::kubernetes::dynamic::split_manifests;
use crate::kubernetes::{
    apply_object, connect, ensure_namespace_exists, wait_for_crd, wait_for_resource, FieldProbe,
    ResourceRef,
};
use crate::olm::install_operator;
use crate::wait::{wait_for, FailurePolicy, WaitOptions};
use base64::{engine::general_purpose::STANDARD, Engine};
use kube::Client;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const SECURED_CLUSTER_CRD: &str = "securedclusters.platform.stackrox.io";

pub fn init_bundle_name(cluster_name: &str) -> String {
    format!("{}-init-bundle", cluster_name)
}

pub fn init_bundle_path(dir: &Path, cluster_name: &str) -> PathBuf {
    dir.join(format!("{}-cluster-init-secrets.yaml", cluster_name))
}

/// Return the init bundle YAML for a cluster, generating it on first use.
///
/// Central only hands out a bundle's secrets once, so the YAML is kept on
/// disk and reused on later runs.
#[instrument(skip(acs, dir))]
pub async fn ensure_init_bundle(acs: &AcsClient, dir: &Path, cluster_name: &str) -> Result<String> {
    let path = init_bundle_path(dir, cluster_name);
    if path.exists() {
        info!("Reusing init bundle {}", path.display());
        return Ok(fs::read_to_string(&path)?);
    }

    let name = init_bundle_name(cluster_name);
    if acs.init_bundle_names().await?.contains(&name) {
        return Err(SetupError::ConfigError(format!(
            "init bundle '{}' already exists in Central but {} is missing; revoke the bundle or restore the file",
            name,
            path.display()
        )));
    }

    let bundle = acs.generate_init_bundle(&name).await?;
    let yaml = String::from_utf8(STANDARD.decode(bundle.kubectl_bundle.trim())?).map_err(|e| {
        SetupError::InvalidManifest(format!("init bundle '{}' is not UTF-8: {}", name, e))
    })?;

    fs::create_dir_all(dir)?;
    fs::write(&path, &yaml)?;
    info!("Generated init bundle {} into {}", name, path.display());
    Ok(yaml)
}

/// Objects of an init bundle, placed in the secured cluster namespace
pub fn init_bundle_objects(yaml: &str, namespace: &str) -> Result<Vec<Value>> {
    let mut objects = split_manifests(yaml)?;
    for object in &mut objects {
        object["metadata"]["namespace"] = Value::String(namespace.to_string());
    }
    Ok(objects)
}

pub fn secured_cluster_manifest(
    settings: &Settings,
    cluster_name: &str,
    central_address: &str,
) -> Value {
    json!({
        "apiVersion": CENTRAL_API_VERSION,
        "kind": "SecuredCluster",
        "metadata": {
            "name": settings.acs.secured_cluster_name,
            "namespace": settings.acs.namespace
        },
        "spec": {
            "clusterName": cluster_name,
            "centralEndpoint": central_address,
            "auditLogs": { "collection": "Auto" },
            "admissionControl": {
                "listenOnCreates": true,
                "listenOnEvents": true,
                "listenOnUpdates": true
            },
            "perNode": {
                "collector": { "collection": "CORE_BPF" },
                "taintToleration": "TolerateTaints"
            },
            "scanner": { "scannerComponent": "AutoSense" }
        }
    })
}

/// Wait until Central reports the cluster as healthy
pub async fn wait_for_cluster_health(
    acs: &AcsClient,
    cluster_name: &str,
    options: &WaitOptions,
) -> Result<()> {
    wait_for(
        &format!("cluster {} to be {} in Central", cluster_name, HEALTHY),
        options,
        || async move {
            let clusters = acs.clusters().await?;
            Ok(clusters
                .into_iter()
                .find(|c| c.name == cluster_name)
                .and_then(|c| c.overall_health().map(str::to_string)))
        },
        |health: &String| health == HEALTHY,
    )
    .await?;
    Ok(())
}

/// Install the operator, init bundle and SecuredCluster on one cluster
#[instrument(skip_all, fields(cluster = %target.name))]
pub async fn install_secured_cluster(
    client: &Client,
    settings: &Settings,
    acs: &AcsClient,
    target: &ClusterTarget,
    central_address: &str,
) -> Result<()> {
    let waits = &settings.waits;
    let namespace = &settings.acs.namespace;

    install_operator(client, &settings.acs.operator, &waits.standard()).await?;
    wait_for_crd(client, SECURED_CLUSTER_CRD, &waits.standard()).await?;
    ensure_namespace_exists(client, namespace).await?;

    let bundle = ensure_init_bundle(acs, &settings.acs.init_bundle_dir, &target.name).await?;
    for object in init_bundle_objects(&bundle, namespace)? {
        apply_object(client, &object).await?;
    }

    let manifest = secured_cluster_manifest(settings, &target.name, central_address);
    apply_object(client, &manifest).await?;

    wait_for_resource(
        client,
        &ResourceRef::from_object(&manifest)?,
        &FieldProbe::condition(DEPLOYED_CONDITION),
        "True",
        &waits.long(),
    )
    .await?;

    FailurePolicy::Warn.apply(wait_for_cluster_health(acs, &target.name, &waits.standard()).await)?;

    info!("Cluster {} is secured", target.name);
    Ok(())
}

/// Secure every selected cluster, one after another.
///
/// The first cluster always fails hard; the others follow
/// `acs.remote_cluster_policy`. Returns the names of clusters that were
/// secured.
pub async fn install_secured_clusters(
    default_client: &Client,
    settings: &Settings,
    acs: &AcsClient,
    targets: &[ClusterTarget],
    central_address: &str,
) -> Result<Vec<String>> {
    let mut secured = Vec::new();

    for (index, target) in targets.iter().enumerate() {
        let policy = if index == 0 {
            FailurePolicy::Fail
        } else {
            settings.acs.remote_cluster_policy
        };

        let result = async {
            let client = match &target.context {
                Some(context) => connect(Some(context)).await?,
                None => default_client.clone(),
            };
            install_secured_cluster(&client, settings, acs, target, central_address).await
        }
        .await;

        if policy.apply(result)?.is_some() {
            secured.push(target.name.clone());
        } else {
            warn!("Cluster {} was not secured", target.name);
        }
    }

    Ok(secured)
}

/// Pick the configured clusters matching `names`, or all of them
pub fn select_targets(
    configured: &[ClusterTarget],
    names: &[String],
) -> Result<Vec<ClusterTarget>> {
    if names.is_empty() {
        return Ok(configured.to_vec());
    }

    names
        .iter()
        .map(|name| {
            configured
                .iter()
                .find(|t| &t.name == name || t.context.as_deref() == Some(name.as_str()))
                .cloned()
                .ok_or_else(|| {
                    SetupError::ConfigError(format!("cluster '{}' is not configured", name))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<ClusterTarget> {
        vec![
            ClusterTarget {
                name: "local-cluster".to_string(),
                context: None,
            },
            ClusterTarget {
                name: "aws-us".to_string(),
                context: Some("aws-us-admin".to_string()),
            },
        ]
    }

    #[test]
    fn test_secured_cluster_manifest() {
        let manifest =
            secured_cluster_manifest(&Settings::default(), "aws-us", "central.example.com:443");

        assert_eq!(manifest["kind"], "SecuredCluster");
        assert_eq!(manifest["metadata"]["namespace"], "stackrox");
        assert_eq!(manifest["spec"]["clusterName"], "aws-us");
        assert_eq!(manifest["spec"]["centralEndpoint"], "central.example.com:443");
    }

    #[test]
    fn test_init_bundle_objects_forces_namespace() {
        let yaml = r#"
apiVersion: v1
kind: Secret
metadata:
  name: sensor-tls
---
apiVersion: v1
kind: Secret
metadata:
  name: collector-tls
  namespace: elsewhere
"#;
        let objects = init_bundle_objects(yaml, "stackrox").unwrap();

        assert_eq!(objects.len(), 2);
        assert!(objects.iter().all(|o| o["metadata"]["namespace"] == "stackrox"));
    }

    #[test]
    fn test_init_bundle_path() {
        assert_eq!(
            init_bundle_path(Path::new("init-bundles"), "aws-us"),
            PathBuf::from("init-bundles/aws-us-cluster-init-secrets.yaml")
        );
    }

    #[test]
    fn test_select_targets_all_by_default() {
        assert_eq!(select_targets(&targets(), &[]).unwrap(), targets());
    }

    #[test]
    fn test_select_targets_by_name_or_context() {
        let selected = select_targets(&targets(), &["aws-us-admin".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "aws-us");

        let selected = select_targets(&targets(), &["local-cluster".to_string()]).unwrap();
        assert_eq!(selected[0].context, None);
    }

    #[test]
    fn test_select_targets_unknown() {
        assert!(select_targets(&targets(), &["nope".to_string()]).is_err());
    }
}
