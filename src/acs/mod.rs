// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Red Hat Advanced Cluster Security: Central, secured clusters and the
//! Central REST API.

pub mod api;
pub mod central;
pub mod compliance;
pub mod namespaces;
pub mod secured_cluster;
pub mod token;

pub use api::{AcsClient, Auth};
pub use central::install_central;
pub use namespaces::{add_layered_product_namespaces, append_namespaces, RegexUpdate};

use crate::config::HttpSettings;
use crate::constants::acs::ADMIN_USER;
use crate::error::{Result, SetupError};
use crate::state::SessionState;

/// Build a Central client from stored state, preferring the API token
pub fn client_from_state(state: &SessionState, http: &HttpSettings) -> Result<AcsClient> {
    let address = state.require_central_address()?;

    let auth = match (&state.rox_api_token, &state.acs_portal_password) {
        (Some(token), _) => Auth::Bearer(token.clone()),
        (None, Some(password)) => Auth::Basic {
            username: state
                .acs_portal_username
                .clone()
                .unwrap_or_else(|| ADMIN_USER.to_string()),
            password: password.clone(),
        },
        (None, None) => {
            return Err(SetupError::StateError(
                "neither ROX_API_TOKEN nor ACS_PORTAL_PASSWORD is known".to_string(),
            ))
        }
    };

    AcsClient::new(address, auth, http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_state_requires_credentials() {
        let state = SessionState {
            rox_central_address: Some("central.example.com:443".to_string()),
            ..Default::default()
        };
        assert!(client_from_state(&state, &HttpSettings::default()).is_err());
    }

    #[test]
    fn test_client_from_state_with_token() {
        let state = SessionState {
            rox_central_address: Some("central.example.com:443".to_string()),
            rox_api_token: Some("tok".to_string()),
            ..Default::default()
        };
        let client = client_from_state(&state, &HttpSettings::default()).unwrap();
        assert_eq!(client.base().host_str(), Some("central.example.com"));
    }
}
