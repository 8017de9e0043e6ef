// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::olm::CSV_SUCCEEDED;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1alpha1", kind = "Subscription")]
#[kube(namespaced)]
#[kube(status = "SubscriptionStatus")]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    pub channel: String,
    /// Package name in the catalog
    pub name: String,
    pub source: String,
    pub source_namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_plan_approval: Option<String>,
    #[serde(rename = "startingCSV", skip_serializing_if = "Option::is_none")]
    pub starting_csv: Option<String>,
}

impl Subscription {
    /// The CSV this subscription installed, or is installing
    pub fn csv_name(&self) -> Option<&str> {
        let status = self.status.as_ref()?;
        status
            .installed_csv
            .as_deref()
            .or(status.current_csv.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn install_plan_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.install_plan_ref.as_ref())
            .map(|r| r.name.as_str())
    }

    pub fn state(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.state.as_deref())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(rename = "currentCSV", skip_serializing_if = "Option::is_none")]
    pub current_csv: Option<String>,
    #[serde(rename = "installedCSV", skip_serializing_if = "Option::is_none")]
    pub installed_csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_plan_ref: Option<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
pub struct ObjectReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "ClusterServiceVersion"
)]
#[kube(namespaced)]
#[kube(status = "ClusterServiceVersionStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ClusterServiceVersion {
    pub fn phase(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.phase.as_deref())
    }

    pub fn succeeded(&self) -> bool {
        self.phase() == Some(CSV_SUCCEEDED)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1alpha1", kind = "InstallPlan")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct InstallPlanSpec {
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub approval: String,
    #[serde(default)]
    pub cluster_service_version_names: Vec<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1", kind = "OperatorGroup")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupSpec {
    /// Absent means the group watches all namespaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespaces: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn make_subscription(status: Option<SubscriptionStatus>) -> Subscription {
        Subscription {
            metadata: ObjectMeta {
                name: Some("rhacs-operator".to_string()),
                namespace: Some("rhacs-operator".to_string()),
                ..Default::default()
            },
            spec: SubscriptionSpec {
                channel: "stable".to_string(),
                name: "rhacs-operator".to_string(),
                source: "redhat-operators".to_string(),
                source_namespace: "openshift-marketplace".to_string(),
                install_plan_approval: None,
                starting_csv: None,
            },
            status,
        }
    }

    #[test]
    fn test_csv_name_prefers_installed() {
        let sub = make_subscription(Some(SubscriptionStatus {
            current_csv: Some("rhacs-operator.v4.6.1".to_string()),
            installed_csv: Some("rhacs-operator.v4.6.0".to_string()),
            ..Default::default()
        }));

        assert_eq!(sub.csv_name(), Some("rhacs-operator.v4.6.0"));
    }

    #[test]
    fn test_csv_name_falls_back_to_current() {
        let sub = make_subscription(Some(SubscriptionStatus {
            current_csv: Some("rhacs-operator.v4.6.1".to_string()),
            ..Default::default()
        }));

        assert_eq!(sub.csv_name(), Some("rhacs-operator.v4.6.1"));
    }

    #[test]
    fn test_csv_name_without_status() {
        assert_eq!(make_subscription(None).csv_name(), None);
    }

    #[test]
    fn test_subscription_status_deserializes_olm_field_names() {
        let status: SubscriptionStatus = serde_json::from_value(serde_json::json!({
            "currentCSV": "a.v1",
            "installedCSV": "a.v1",
            "installPlanRef": { "name": "install-abcde", "namespace": "rhacs-operator" },
            "state": "AtLatestKnown"
        }))
        .unwrap();
        let sub = make_subscription(Some(status));

        assert_eq!(sub.csv_name(), Some("a.v1"));
        assert_eq!(sub.install_plan_name(), Some("install-abcde"));
        assert_eq!(sub.state(), Some("AtLatestKnown"));
    }

    #[test]
    fn test_subscription_spec_serializes_starting_csv() {
        let mut sub = make_subscription(None);
        sub.spec.starting_csv = Some("rhacs-operator.v4.5.0".to_string());

        let value = serde_json::to_value(&sub.spec).unwrap();

        assert_eq!(value["startingCSV"], "rhacs-operator.v4.5.0");
        assert_eq!(value["sourceNamespace"], "openshift-marketplace");
        assert!(value.get("installPlanApproval").is_none());
    }

    #[test]
    fn test_csv_succeeded() {
        let csv: ClusterServiceVersion = serde_json::from_value(serde_json::json!({
            "apiVersion": "operators.coreos.com/v1alpha1",
            "kind": "ClusterServiceVersion",
            "metadata": { "name": "rhacs-operator.v4.6.0" },
            "spec": { "displayName": "Advanced Cluster Security for Kubernetes", "install": {} },
            "status": { "phase": "Succeeded" }
        }))
        .unwrap();

        assert!(csv.succeeded());
        assert_eq!(csv.spec.version, None);
    }

    #[test]
    fn test_csv_installing_is_not_succeeded() {
        let csv: ClusterServiceVersion = serde_json::from_value(serde_json::json!({
            "apiVersion": "operators.coreos.com/v1alpha1",
            "kind": "ClusterServiceVersion",
            "metadata": { "name": "rhacs-operator.v4.6.0" },
            "spec": {},
            "status": { "phase": "Installing" }
        }))
        .unwrap();

        assert!(!csv.succeeded());
        assert_eq!(csv.phase(), Some("Installing"));
    }
}
