// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compliance operator plus a daily RHACS scan schedule

use crate::acs::client_from_state;
use crate::acs::compliance::ensure_scan_schedule;
use crate::config::Settings;
use crate::error::Result;
use crate::kubernetes::wait_for_crd;
use crate::olm::install_operator;
use crate::state::StateStore;
use kube::Client;
use tracing::{info, instrument};

pub const SCAN_SETTING_BINDING_CRD: &str = "scansettingbindings.compliance.openshift.io";

/// Install the compliance operator and make sure Central schedules scans.
///
/// Returns whether a new scan configuration was created.
#[instrument(skip_all)]
pub async fn install_compliance(
    client: &Client,
    settings: &Settings,
    store: &StateStore,
) -> Result<bool> {
    let compliance = &settings.compliance;

    install_operator(client, &compliance.operator, &settings.waits.standard()).await?;
    wait_for_crd(client, SCAN_SETTING_BINDING_CRD, &settings.waits.standard()).await?;
    info!("Compliance operator installed in {}", compliance.operator.namespace);

    let acs = client_from_state(&store.load()?.with_env_overrides(), &settings.http)?;
    ensure_scan_schedule(&acs, compliance).await
}
