// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The full installation, step after step

use crate::acs::secured_cluster::install_secured_clusters;
use crate::acs::{add_layered_product_namespaces, client_from_state, install_central, token};
use crate::apps::{install_apps, AppsReport};
use crate::certs::{install_cert_manager, secure_central};
use crate::compliance::install_compliance;
use crate::config::Settings;
use crate::error::Result;
use crate::keycloak::install_keycloak;
use crate::rhoai::install_rhoai;
use crate::rhtas::install_rhtas;
use crate::state::StateStore;
use crate::wait::FailurePolicy;
use kube::Client;
use std::path::Path;
use tracing::{info, warn};

/// Optional steps to leave out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags {
    pub keycloak: bool,
    pub rhtas: bool,
    pub rhoai: bool,
    pub certs: bool,
    pub compliance: bool,
    pub apps: bool,
}

/// What a setup run produced
#[derive(Debug, Default)]
pub struct SetupSummary {
    pub central_address: String,
    pub secured_clusters: Vec<String>,
    pub namespaces_added: usize,
    pub scan_created: Option<bool>,
    pub oidc_issuer: Option<String>,
    pub tuf_url: Option<String>,
    pub apps: Option<AppsReport>,
}

/// The configured tutorial home, or the working directory
pub fn tutorial_home(settings: &Settings, cwd: &Path) -> String {
    settings
        .tutorial_home
        .clone()
        .unwrap_or_else(|| cwd.display().to_string())
}

pub async fn run_setup(
    client: &Client,
    settings: &Settings,
    store: &StateStore,
    skip: SkipFlags,
) -> Result<SetupSummary> {
    let mut summary = SetupSummary::default();

    let home = tutorial_home(settings, &std::env::current_dir()?);
    store.update(|state| state.tutorial_home = Some(home.clone()))?;

    if !skip.certs {
        install_cert_manager(client, settings).await?;
    }

    let central = install_central(client, settings, store).await?;
    summary.central_address = central.address.clone();

    token::generate_and_store(settings, store, None).await?;
    let acs = client_from_state(&store.load()?.with_env_overrides(), &settings.http)?;

    let clusters = &settings.acs.clusters;
    summary.secured_clusters =
        install_secured_clusters(client, settings, &acs, clusters, &central.address).await?;

    if !skip.certs {
        secure_central(client, settings).await?;
    }

    // Older Central versions have no layered products rule
    let acs_settings = &settings.acs;
    let update = FailurePolicy::Warn.apply(
        add_layered_product_namespaces(
            &acs,
            &acs_settings.layered_rule_name,
            &acs_settings.layered_namespaces,
        )
        .await,
    )?;
    summary.namespaces_added = update.map(|u| u.added).unwrap_or_default();

    if !skip.compliance {
        summary.scan_created = Some(install_compliance(client, settings, store).await?);
    }

    if !skip.keycloak {
        summary.oidc_issuer = Some(install_keycloak(client, settings, store).await?);
    }

    if !skip.rhtas {
        let endpoints = install_rhtas(client, settings, store).await?;
        summary.tuf_url = Some(endpoints.tuf);
    }

    if !skip.rhoai {
        install_rhoai(client, settings).await?;
    }

    if !skip.apps {
        let report = install_apps(client, settings, None, None).await?;
        if !report.is_success() {
            warn!("Some demo applications did not become ready: {:?}", report.failed);
        }
        summary.apps = Some(report);
    }

    info!(
        "Setup complete: Central at {}, {} secured cluster(s)",
        summary.central_address,
        summary.secured_clusters.len()
    );
    Ok(summary)
}
