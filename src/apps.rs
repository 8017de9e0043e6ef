// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Demo application deployment from a directory of manifests

use crate::config::{AppSettings, Settings};
use crate::error::{Result, SetupError};
use crate::kubernetes::dynamic::split_manifests;
use crate::kubernetes::{apply_object, ensure_namespace_exists, ResourceRef};
use crate::wait::{wait_for, WaitOptions};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "Namespace",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "PersistentVolume",
    "StorageClass",
    "SecurityContextConstraints",
];

/// Outcome of a deployment run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppsReport {
    pub applied: Vec<String>,
    pub ready: Vec<String>,
    pub failed: Vec<String>,
}

impl AppsReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `*.yaml` and `*.yml` files of a directory, sorted by name
pub fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            SetupError::NotFound(format!("manifests directory {}", dir.display()))
        }
        _ => SetupError::IoError(e),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Put namespaced objects without a namespace into `namespace`
pub fn place_in_namespace(object: &mut Value, namespace: &str) {
    let kind = object.get("kind").and_then(Value::as_str).unwrap_or_default();
    if CLUSTER_SCOPED_KINDS.contains(&kind) {
        return;
    }
    if object.pointer("/metadata/namespace").is_none() {
        object["metadata"]["namespace"] = Value::String(namespace.to_string());
    }
}

/// Objects of one manifest file, each with the reference it will be applied as
pub fn load_file(file: &Path, namespace: &str) -> Result<Vec<(ResourceRef, Value)>> {
    let invalid = |e: SetupError| SetupError::InvalidManifest(format!("{}: {}", file.display(), e));

    let content = fs::read_to_string(file)?;
    let mut objects = Vec::new();
    for mut object in split_manifests(&content).map_err(invalid)? {
        place_in_namespace(&mut object, namespace);
        let target = ResourceRef::from_object(&object).map_err(invalid)?;
        objects.push((target, object));
    }
    Ok(objects)
}

pub fn load_manifests(dir: &Path, namespace: &str) -> Result<Vec<(ResourceRef, Value)>> {
    let mut objects = Vec::new();
    for file in manifest_files(dir)? {
        objects.extend(load_file(&file, namespace)?);
    }
    Ok(objects)
}

/// Wait until a deployment has as many available replicas as it wants
pub async fn wait_for_deployment(
    client: &Client,
    namespace: &str,
    name: &str,
    options: &WaitOptions,
) -> Result<()> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployments = &deployments;

    wait_for(
        &format!("Deployment {}/{} to be available", namespace, name),
        options,
        || async move {
            Ok(deployments.get_opt(name).await?.map(|d| {
                let desired = d.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
                let available = d
                    .status
                    .as_ref()
                    .and_then(|s| s.available_replicas)
                    .unwrap_or(0);
                (available, desired)
            }))
        },
        |(available, desired): &(i32, i32)| available >= desired,
    )
    .await?;
    Ok(())
}

/// Apply every manifest and wait for the deployments among them.
///
/// Failures are handled with `apps.policy`; under `warn` they are collected
/// in the report and the remaining files and objects are still processed.
/// A missing directory is then treated like an empty one.
#[instrument(skip_all, fields(dir = %apps.manifests_dir.display(), namespace = %apps.namespace))]
pub async fn deploy_apps(
    client: &Client,
    apps: &AppSettings,
    options: &WaitOptions,
) -> Result<AppsReport> {
    let mut report = AppsReport::default();

    let files = apps.policy.apply(manifest_files(&apps.manifests_dir))?.unwrap_or_default();
    let mut objects = Vec::new();
    for file in &files {
        match apps.policy.apply(load_file(file, &apps.namespace))? {
            Some(loaded) => objects.extend(loaded),
            None => report.failed.push(file.display().to_string()),
        }
    }

    if objects.is_empty() {
        warn!("No manifests to deploy from {}", apps.manifests_dir.display());
        return Ok(report);
    }

    ensure_namespace_exists(client, &apps.namespace).await?;

    let mut deployments = Vec::new();
    for (target, object) in &objects {
        match apps.policy.apply(apply_object(client, object).await)? {
            Some(_) => {
                report.applied.push(target.to_string());
                if target.resource.kind == "Deployment" {
                    deployments.push(target);
                }
            }
            None => report.failed.push(target.to_string()),
        }
    }

    for target in deployments {
        let namespace = target.namespace.as_deref().unwrap_or(&apps.namespace);
        let result = wait_for_deployment(client, namespace, &target.name, options).await;
        match apps.policy.apply(result)? {
            Some(()) => report.ready.push(target.to_string()),
            None => report.failed.push(target.to_string()),
        }
    }

    info!(
        "Applied {} objects, {} deployments ready, {} failed",
        report.applied.len(),
        report.ready.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Deploy from the configured directory and namespace, optionally overridden
pub async fn install_apps(
    client: &Client,
    settings: &Settings,
    dir: Option<&Path>,
    namespace: Option<&str>,
) -> Result<AppsReport> {
    let mut apps = settings.apps.clone();
    if let Some(dir) = dir {
        apps.manifests_dir = dir.to_path_buf();
    }
    if let Some(namespace) = namespace {
        apps.namespace = namespace.to_string();
    }
    deploy_apps(client, &apps, &settings.waits.standard()).await
}
