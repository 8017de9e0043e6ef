// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API token generation

use crate::acs::api::{AcsClient, Auth};
use crate::config::Settings;
use crate::constants::acs::ADMIN_USER;
use crate::error::{Result, SetupError};
use crate::state::StateStore;
use tracing::info;

/// Generate an API token with the admin password and store it as ROX_API_TOKEN.
///
/// gRPC clients such as roxctl talk to Central through the passthrough route,
/// which needs ALPN enforcement turned off; that is recorded alongside.
pub async fn generate_and_store(
    settings: &Settings,
    store: &StateStore,
    name: Option<&str>,
) -> Result<String> {
    let state = store.load()?.with_env_overrides();
    let address = state.require_central_address()?;
    let password = state.acs_portal_password.clone().ok_or_else(|| {
        SetupError::StateError(
            "ACS_PORTAL_PASSWORD is not known yet, install Central first".to_string(),
        )
    })?;
    let username = state
        .acs_portal_username
        .clone()
        .unwrap_or_else(|| ADMIN_USER.to_string());

    let acs = AcsClient::new(address, Auth::Basic { username, password }, &settings.http)?;
    let name = name.unwrap_or(&settings.acs.token_name);
    let token = acs.generate_api_token(name, &settings.acs.token_role).await?;

    store.update(|state| {
        state.rox_api_token = Some(token.clone());
        state.grpc_enforce_alpn_enabled = Some("false".to_string());
    })?;

    info!("Generated API token '{}' with role {}", name, settings.acs.token_role);
    Ok(token)
}
