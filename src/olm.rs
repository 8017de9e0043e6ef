// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator installation through the Operator Lifecycle Manager.
//!
//! Installing an operator is: make sure the namespace and an OperatorGroup
//! exist, apply a Subscription, wait for the Subscription to name its CSV,
//! then wait for that CSV to reach the `Succeeded` phase.

use crate::constants::olm::{
    CSV_SUCCEEDED, DEFAULT_SOURCE, DEFAULT_SOURCE_NAMESPACE, GLOBAL_OPERATORS_NAMESPACE,
};
use crate::constants::FIELD_MANAGER;
use crate::error::Result;
use crate::kubernetes::diagnostics;
use crate::kubernetes::ensure_namespace_exists;
use crate::kubernetes::ResourceRef;
use crate::types::olm::{InstallPlan, OperatorGroupSpec, SubscriptionSpec};
use crate::types::{ClusterServiceVersion, OperatorGroup, Subscription};
use crate::wait::{wait_for, WaitOptions};
use kube::{
    api::{ApiResource, ListParams, ObjectMeta, Patch, PatchParams},
    Api, Client, Resource,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Approval {
    #[default]
    Automatic,
    Manual,
}

impl Approval {
    pub fn as_str(self) -> &'static str {
        match self {
            Approval::Automatic => "Automatic",
            Approval::Manual => "Manual",
        }
    }
}

/// What to install and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSpec {
    /// Package name in the catalog, also used as the Subscription name
    pub package: String,
    pub namespace: String,
    pub channel: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_source_namespace")]
    pub source_namespace: String,
    /// Namespaces watched by a newly created OperatorGroup; `None` means all
    #[serde(default)]
    pub target_namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub approval: Approval,
    #[serde(default)]
    pub starting_csv: Option<String>,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_source_namespace() -> String {
    DEFAULT_SOURCE_NAMESPACE.to_string()
}

impl OperatorSpec {
    pub fn new(package: &str, namespace: &str, channel: &str) -> Self {
        Self {
            package: package.to_string(),
            namespace: namespace.to_string(),
            channel: channel.to_string(),
            source: default_source(),
            source_namespace: default_source_namespace(),
            target_namespaces: None,
            approval: Approval::Automatic,
            starting_csv: None,
        }
    }

    /// Restrict a newly created OperatorGroup to the operator's own namespace
    pub fn own_namespace(mut self) -> Self {
        self.target_namespaces = Some(vec![self.namespace.clone()]);
        self
    }

    pub fn subscription(&self) -> Subscription {
        Subscription {
            metadata: ObjectMeta {
                name: Some(self.package.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            spec: SubscriptionSpec {
                channel: self.channel.clone(),
                name: self.package.clone(),
                source: self.source.clone(),
                source_namespace: self.source_namespace.clone(),
                install_plan_approval: Some(self.approval.as_str().to_string()),
                starting_csv: self.starting_csv.clone(),
            },
            status: None,
        }
    }

    pub fn operator_group(&self) -> OperatorGroup {
        OperatorGroup {
            metadata: ObjectMeta {
                name: Some(self.namespace.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            spec: OperatorGroupSpec {
                target_namespaces: self.target_namespaces.clone(),
            },
        }
    }
}

/// Install an operator and wait for its CSV to succeed. Returns the CSV name.
#[instrument(skip_all, fields(package = %spec.package, namespace = %spec.namespace))]
pub async fn install_operator(
    client: &Client,
    spec: &OperatorSpec,
    options: &WaitOptions,
) -> Result<String> {
    info!(
        "Installing operator {} from channel {} into {}",
        spec.package, spec.channel, spec.namespace
    );

    ensure_namespace_exists(client, &spec.namespace).await?;
    ensure_operator_group(client, spec).await?;

    let subscriptions: Api<Subscription> = Api::namespaced(client.clone(), &spec.namespace);
    subscriptions
        .patch(
            &spec.package,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&spec.subscription()),
        )
        .await?;

    let result = wait_for_csv(client, spec, options).await;
    if result.is_err() {
        error!("Operator {} did not install, dumping OLM state", spec.package);
        dump_olm_state(client, spec).await;
    }
    result
}

async fn ensure_operator_group(client: &Client, spec: &OperatorSpec) -> Result<()> {
    // OpenShift ships global-operators there
    if spec.namespace == GLOBAL_OPERATORS_NAMESPACE {
        return Ok(());
    }

    let groups: Api<OperatorGroup> = Api::namespaced(client.clone(), &spec.namespace);
    let existing = groups.list(&ListParams::default()).await?;

    if let Some(group) = existing.items.first() {
        info!(
            "Using existing OperatorGroup {} in {}",
            group.metadata.name.as_deref().unwrap_or_default(),
            spec.namespace
        );
        return Ok(());
    }

    let group = spec.operator_group();
    groups
        .patch(
            &spec.namespace,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&group),
        )
        .await?;
    info!("Created OperatorGroup {}", spec.namespace);
    Ok(())
}

async fn wait_for_csv(
    client: &Client,
    spec: &OperatorSpec,
    options: &WaitOptions,
) -> Result<String> {
    let subscriptions: Api<Subscription> = Api::namespaced(client.clone(), &spec.namespace);
    let subscriptions = &subscriptions;
    let manual = spec.approval == Approval::Manual;

    // A manual subscription is only resolved once it also references its InstallPlan
    let (csv_name, plan) = wait_for(
        &format!("Subscription {} to resolve a CSV", spec.package),
        options,
        || async move {
            let sub = subscriptions.get_opt(&spec.package).await?;
            Ok(sub.and_then(|s| {
                let plan = s.install_plan_name().map(str::to_string);
                s.csv_name().map(|csv| (csv.to_string(), plan))
            }))
        },
        |(_, plan): &(String, Option<String>)| !manual || plan.is_some(),
    )
    .await?
    .value;
    info!("Subscription {} resolved CSV {}", spec.package, csv_name);

    if let (true, Some(plan)) = (manual, plan.as_deref()) {
        approve_install_plan(client, &spec.namespace, plan).await?;
    }

    let csvs: Api<ClusterServiceVersion> = Api::namespaced(client.clone(), &spec.namespace);
    let csvs = &csvs;
    let name = csv_name.as_str();

    wait_for(
        &format!("CSV {} to reach {}", csv_name, CSV_SUCCEEDED),
        options,
        || async move {
            let csv = csvs.get_opt(name).await?;
            Ok(csv.and_then(|c| c.phase().map(str::to_string)))
        },
        |phase: &String| phase == CSV_SUCCEEDED,
    )
    .await?;

    info!("Operator {} installed ({})", spec.package, csv_name);
    Ok(csv_name)
}

async fn approve_install_plan(client: &Client, namespace: &str, plan: &str) -> Result<()> {
    let plans: Api<InstallPlan> = Api::namespaced(client.clone(), namespace);
    let current = plans.get(plan).await?;
    if current.spec.approved {
        return Ok(());
    }

    info!("Approving InstallPlan {}", plan);
    plans
        .patch(
            plan,
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "spec": { "approved": true } })),
        )
        .await?;
    Ok(())
}

fn api_resource<K: Resource<DynamicType = ()>>() -> ApiResource {
    ApiResource::erase::<K>(&())
}

async fn dump_olm_state(client: &Client, spec: &OperatorSpec) {
    let subscription = ResourceRef {
        resource: api_resource::<Subscription>(),
        name: spec.package.clone(),
        namespace: Some(spec.namespace.clone()),
    };
    diagnostics::dump(client, &[subscription]).await;
    diagnostics::dump_all(client, &api_resource::<InstallPlan>(), &spec.namespace).await;
    diagnostics::dump_all(client, &api_resource::<ClusterServiceVersion>(), &spec.namespace).await;
}
