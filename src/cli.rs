// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line interface

use crate::kubernetes::{FieldProbe, ResourceRef};
use crate::setup::SkipFlags;
use crate::wait::WaitOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Install and wire up Red Hat security and AI operators on OpenShift
#[derive(Parser, Debug)]
#[command(name = "opsetup", version, about, long_about = None)]
pub struct Cli {
    /// YAML settings file
    #[arg(long, global = true, env = "OPSETUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long, global = true, env = "OPSETUP_CONTEXT")]
    pub context: Option<String>,

    /// State file shared between commands
    #[arg(long, global = true, env = "OPSETUP_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every installation step in order
    Setup(SetupArgs),
    /// Advanced Cluster Security
    #[command(subcommand)]
    Acs(AcsCommand),
    /// Red Hat Single Sign-On with a realm for Trusted Artifact Signer
    Keycloak,
    /// Trusted Artifact Signer
    Rhtas,
    /// OpenShift AI
    Rhoai,
    /// cert-manager and a certificate for Central
    Certs,
    /// Compliance operator and a daily scan schedule
    Compliance,
    /// Deploy the demo applications
    Apps(AppsArgs),
    /// Wait for a field or condition of any resource
    Wait(WaitArgs),
    /// Print the recorded values as shell export lines
    Env,
}

#[derive(Args, Debug, Default)]
pub struct SetupArgs {
    #[arg(long)]
    pub skip_keycloak: bool,
    #[arg(long)]
    pub skip_rhtas: bool,
    #[arg(long)]
    pub skip_rhoai: bool,
    #[arg(long)]
    pub skip_certs: bool,
    #[arg(long)]
    pub skip_compliance: bool,
    #[arg(long)]
    pub skip_apps: bool,
}

impl SetupArgs {
    pub fn skip_flags(&self) -> SkipFlags {
        SkipFlags {
            keycloak: self.skip_keycloak,
            rhtas: self.skip_rhtas,
            rhoai: self.skip_rhoai,
            certs: self.skip_certs,
            compliance: self.skip_compliance,
            apps: self.skip_apps,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AcsCommand {
    /// Install the operator and Central
    Central,
    /// Install SecuredClusters on the configured clusters
    SecuredCluster {
        /// Only these clusters (by name or kubeconfig context)
        #[arg(long = "cluster")]
        clusters: Vec<String>,
    },
    /// Generate an API token and record it
    Token {
        #[arg(long)]
        name: Option<String>,
    },
    /// Add namespaces to the layered products platform rule
    AddNamespaces {
        /// Namespaces to add; the configured list when empty
        namespaces: Vec<String>,
    },
    /// Create the daily compliance scan schedule
    ComplianceSchedule,
}

#[derive(Args, Debug)]
pub struct AppsArgs {
    /// Directory of manifests
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Namespace for objects that do not name one
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("probe").required(true).args(["field", "condition"])
))]
pub struct WaitArgs {
    #[arg(long)]
    pub api_version: String,
    #[arg(long)]
    pub kind: String,
    #[arg(long)]
    pub name: String,
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// JSON pointer into the object, e.g. /status/phase
    #[arg(long)]
    pub field: Option<String>,

    /// Condition type whose status is compared
    #[arg(long)]
    pub condition: Option<String>,

    #[arg(long)]
    pub expected: String,

    /// Seconds between polls
    #[arg(long)]
    pub interval: Option<u64>,

    /// Seconds before giving up
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl WaitArgs {
    pub fn target(&self) -> ResourceRef {
        ResourceRef::new(&self.api_version, &self.kind, &self.name, self.namespace.as_deref())
    }

    pub fn probe(&self) -> FieldProbe {
        match (&self.field, &self.condition) {
            (Some(field), _) => FieldProbe::pointer(field.clone()),
            (None, Some(condition)) => FieldProbe::condition(condition.clone()),
            // clap enforces one of the two
            (None, None) => FieldProbe::pointer("/status/phase"),
        }
    }

    pub fn options(&self, defaults: WaitOptions) -> WaitOptions {
        let mut options = defaults;
        if let Some(interval) = self.interval {
            options.interval = std::time::Duration::from_secs(interval);
        }
        if let Some(timeout) = self.timeout {
            options.timeout = std::time::Duration::from_secs(timeout);
        }
        options
    }
}
