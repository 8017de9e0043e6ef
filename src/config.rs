// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Settings for every install flow.
//!
//! Built-in defaults are merged with an optional YAML file and then with
//! `OPSETUP_`-prefixed environment variables (`OPSETUP_ACS__NAMESPACE=...`).

use crate::olm::OperatorSpec;
use crate::wait::{FailurePolicy, WaitOptions};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    /// Where values shared between commands are kept
    pub state_file: Option<PathBuf>,
    /// Recorded as TUTORIAL_HOME for the workshop material
    pub tutorial_home: Option<String>,
    pub waits: WaitSettings,
    pub http: HttpSettings,
    pub acs: AcsSettings,
    pub compliance: ComplianceSettings,
    pub keycloak: KeycloakSettings,
    pub rhtas: RhtasSettings,
    pub rhoai: RhoaiSettings,
    pub certs: CertSettings,
    pub apps: AppSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            state_file: None,
            tutorial_home: None,
            waits: WaitSettings::default(),
            http: HttpSettings::default(),
            acs: AcsSettings::default(),
            compliance: ComplianceSettings::default(),
            keycloak: KeycloakSettings::default(),
            rhtas: RhtasSettings::default(),
            rhoai: RhoaiSettings::default(),
            certs: CertSettings::default(),
            apps: AppSettings::default(),
        }
    }
}

impl Settings {
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed("OPSETUP_").split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path).extract().map_err(Box::new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    /// Budget for slow resources such as Central, Securesign and DataScienceCluster
    pub long_timeout_secs: u64,
    pub progress_every: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 600,
            long_timeout_secs: 900,
            progress_every: 6,
        }
    }
}

impl WaitSettings {
    pub fn standard(&self) -> WaitOptions {
        WaitOptions {
            interval: Duration::from_secs(self.interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            progress_every: self.progress_every,
        }
    }

    pub fn long(&self) -> WaitOptions {
        self.standard()
            .with_timeout(Duration::from_secs(self.long_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Skip TLS verification against cluster routes (self-signed by default)
    pub insecure_skip_tls_verify: bool,
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            insecure_skip_tls_verify: true,
            timeout_secs: 30,
        }
    }
}

/// One cluster to secure, reached through a kubeconfig context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTarget {
    /// Cluster name as shown in Central
    pub name: String,
    /// Kubeconfig context; `None` uses the current one
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcsSettings {
    pub operator: OperatorSpec,
    pub namespace: String,
    pub central_name: String,
    pub secured_cluster_name: String,
    pub clusters: Vec<ClusterTarget>,
    pub init_bundle_dir: PathBuf,
    pub token_name: String,
    pub token_role: String,
    pub layered_rule_name: String,
    pub layered_namespaces: Vec<String>,
    /// Policy for clusters other than the first (e.g. a remote spoke)
    pub remote_cluster_policy: FailurePolicy,
}

impl Default for AcsSettings {
    fn default() -> Self {
        Self {
            operator: OperatorSpec::new("rhacs-operator", "rhacs-operator", "stable")
                .own_namespace(),
            namespace: "stackrox".to_string(),
            central_name: "rhacs-central-services".to_string(),
            secured_cluster_name: "stackrox-secured-cluster-services".to_string(),
            clusters: vec![ClusterTarget {
                name: "local-cluster".to_string(),
                context: None,
            }],
            init_bundle_dir: PathBuf::from("init-bundles"),
            token_name: "opsetup-admin".to_string(),
            token_role: "Admin".to_string(),
            layered_rule_name: "red hat layered products".to_string(),
            layered_namespaces: [
                "rhacs-operator",
                "openshift-compliance",
                "cert-manager-operator",
                "cert-manager",
                "rhsso",
                "trusted-artifact-signer",
                "redhat-ods-operator",
                "redhat-ods-applications",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            remote_cluster_policy: FailurePolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceSettings {
    pub operator: OperatorSpec,
    pub scan_name: String,
    pub description: String,
    pub profiles: Vec<String>,
    pub hour: u32,
    pub minute: u32,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            operator: OperatorSpec::new("compliance-operator", "openshift-compliance", "stable")
                .own_namespace(),
            scan_name: "daily-cis-scan".to_string(),
            description: "Daily CIS benchmark scan".to_string(),
            profiles: vec!["ocp4-cis".to_string(), "ocp4-cis-node".to_string()],
            hour: 12,
            minute: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeycloakUserSettings {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl Default for KeycloakUserSettings {
    fn default() -> Self {
        Self {
            username: "jdoe".to_string(),
            email: "jdoe@redhat.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            password: "secure".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeycloakSettings {
    pub operator: OperatorSpec,
    pub name: String,
    pub realm: String,
    pub client_id: String,
    pub user: KeycloakUserSettings,
}

impl Default for KeycloakSettings {
    fn default() -> Self {
        Self {
            operator: OperatorSpec::new("rhsso-operator", "rhsso", "stable").own_namespace(),
            name: "rhsso-instance".to_string(),
            realm: "openshift".to_string(),
            client_id: "trusted-artifact-signer".to_string(),
            user: KeycloakUserSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OidcProviderKind {
    #[default]
    Keycloak,
    OpenshiftOauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RhtasSettings {
    pub operator: OperatorSpec,
    pub namespace: String,
    pub name: String,
    pub oidc_provider: OidcProviderKind,
    /// Client id for the OpenShift OAuth provider; Keycloak uses `keycloak.client_id`
    pub oauth_client_id: String,
    pub organization_name: String,
    pub organization_email: String,
    pub common_name: String,
}

impl Default for RhtasSettings {
    fn default() -> Self {
        Self {
            operator: OperatorSpec::new("rhtas-operator", "openshift-operators", "stable"),
            namespace: "trusted-artifact-signer".to_string(),
            name: "securesign-sample".to_string(),
            oidc_provider: OidcProviderKind::Keycloak,
            oauth_client_id: "openshift-challenging-client".to_string(),
            organization_name: "Red Hat".to_string(),
            organization_email: "jdoe@redhat.com".to_string(),
            common_name: "fulcio.hostname".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RhoaiSettings {
    pub operator: OperatorSpec,
    pub name: String,
    /// Components set to Managed; every other known component is Removed
    pub managed_components: Vec<String>,
}

impl Default for RhoaiSettings {
    fn default() -> Self {
        Self {
            operator: OperatorSpec::new("rhods-operator", "redhat-ods-operator", "stable"),
            name: "default-dsc".to_string(),
            managed_components: [
                "dashboard",
                "workbenches",
                "datasciencepipelines",
                "kserve",
                "modelmeshserving",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertSettings {
    pub operator: OperatorSpec,
    pub issuer_name: String,
    /// ACME account email; a self-signed issuer is used when unset
    pub acme_email: Option<String>,
    pub acme_server: String,
    pub certificate_name: String,
    pub secret_name: String,
}

impl Default for CertSettings {
    fn default() -> Self {
        Self {
            operator: OperatorSpec::new(
                "openshift-cert-manager-operator",
                "cert-manager-operator",
                "stable-v1",
            )
            .own_namespace(),
            issuer_name: "opsetup-issuer".to_string(),
            acme_email: None,
            acme_server: "https://acme-v02.api.letsencrypt.org/directory".to_string(),
            certificate_name: "central-tls".to_string(),
            secret_name: "central-default-tls-cert".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub manifests_dir: PathBuf,
    pub namespace: String,
    pub policy: FailurePolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            manifests_dir: PathBuf::from("apps"),
            namespace: "demo-apps".to_string(),
            policy: FailurePolicy::Warn,
        }
    }
}
