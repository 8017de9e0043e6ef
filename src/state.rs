// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Values handed from one command to the next.
//!
//! Central's address, the API token, portal credentials and the RHTAS
//! endpoints are written to a JSON file after the step that discovers them
//! and read back by later invocations. `opsetup env` prints them as shell
//! `export` lines.

use crate::constants::env;
use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rox_api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rox_central_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acs_portal_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acs_portal_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial_home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_enforce_alpn_enabled: Option<String>,
    /// Anything else worth exporting (Keycloak issuer, cosign endpoints, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl SessionState {
    /// Apply the process environment on top of stored values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (key, slot) in [
            (env::ROX_API_TOKEN, &mut self.rox_api_token),
            (env::ROX_CENTRAL_ADDRESS, &mut self.rox_central_address),
            (env::ACS_PORTAL_USERNAME, &mut self.acs_portal_username),
            (env::ACS_PORTAL_PASSWORD, &mut self.acs_portal_password),
            (env::TUTORIAL_HOME, &mut self.tutorial_home),
            (env::GRPC_ENFORCE_ALPN_ENABLED, &mut self.grpc_enforce_alpn_enabled),
        ] {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        }
        self
    }

    pub fn set_extra(&mut self, key: &str, value: impl Into<String>) {
        self.extra.insert(key.to_string(), value.into());
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    pub fn require_central_address(&self) -> Result<&str> {
        self.rox_central_address.as_deref().ok_or_else(|| {
            SetupError::StateError(format!(
                "{} is not known yet, install Central first",
                env::ROX_CENTRAL_ADDRESS
            ))
        })
    }

    /// All values as ordered key/value pairs
    pub fn entries(&self) -> Vec<(String, String)> {
        let fixed = [
            (env::ROX_API_TOKEN, &self.rox_api_token),
            (env::ROX_CENTRAL_ADDRESS, &self.rox_central_address),
            (env::ACS_PORTAL_USERNAME, &self.acs_portal_username),
            (env::ACS_PORTAL_PASSWORD, &self.acs_portal_password),
            (env::TUTORIAL_HOME, &self.tutorial_home),
            (env::GRPC_ENFORCE_ALPN_ENABLED, &self.grpc_enforce_alpn_enabled),
        ];

        fixed
            .into_iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())))
            .chain(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    /// `export KEY='value'` lines, safe to `eval` in a POSIX shell
    pub fn export_lines(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(k, v)| format!("export {}={}", k, shell_quote(&v)))
            .collect()
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Reads and writes the state file
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.config/opsetup/state.json`, or `./opsetup-state.json` without a home
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/opsetup/state.json"))
            .unwrap_or_else(|| PathBuf::from("opsetup-state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state; a missing file is an empty state
    pub fn load(&self) -> Result<SessionState> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                SetupError::StateError(format!("{} is not valid: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", self.path.display());
                Ok(SessionState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents with `state` (write to a sibling, then rename)
    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;

        info!("Saved state to {}", self.path.display());
        Ok(())
    }

    /// Load, modify and save in one go
    pub fn update(&self, change: impl FnOnce(&mut SessionState)) -> Result<SessionState> {
        let mut state = self.load()?;
        change(&mut state);
        self.save(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn make_state() -> SessionState {
        SessionState {
            rox_api_token: Some("tok".to_string()),
            rox_central_address: Some("central.apps.example.com:443".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        assert_eq!(store.load().unwrap(), SessionState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));
        let mut state = make_state();
        state.set_extra("COSIGN_FULCIO_URL", "https://fulcio.example.com");

        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
        assert!(!dir.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn test_file_uses_environment_variable_names() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save(&make_state()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();

        assert_eq!(raw["ROX_API_TOKEN"], "tok");
        assert!(raw.get("ACS_PORTAL_PASSWORD").is_none());
    }

    #[test]
    fn test_update_keeps_existing_values() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save(&make_state()).unwrap();

        let updated = store
            .update(|s| s.acs_portal_password = Some("pw".to_string()))
            .unwrap();

        assert_eq!(updated.rox_api_token.as_deref(), Some("tok"));
        assert_eq!(store.load().unwrap().acs_portal_password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            StateStore::new(path).load(),
            Err(SetupError::StateError(_))
        ));
    }

    #[test]
    fn test_overrides_replace_stored_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (env::ROX_API_TOKEN, "from-env"),
            (env::TUTORIAL_HOME, "/home/lab"),
        ]);

        let state = make_state().with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(state.rox_api_token.as_deref(), Some("from-env"));
        assert_eq!(state.tutorial_home.as_deref(), Some("/home/lab"));
        assert_eq!(
            state.rox_central_address.as_deref(),
            Some("central.apps.example.com:443")
        );
    }

    #[test]
    fn test_export_lines_quote_values() {
        let mut state = make_state();
        state.acs_portal_password = Some("it's".to_string());

        let lines = state.export_lines();

        assert_eq!(lines[0], "export ROX_API_TOKEN='tok'");
        assert!(lines.contains(&r"export ACS_PORTAL_PASSWORD='it'\''s'".to_string()));
    }

    #[test]
    fn test_require_central_address() {
        assert!(SessionState::default().require_central_address().is_err());
        assert_eq!(
            make_state().require_central_address().unwrap(),
            "central.apps.example.com:443"
        );
    }
}
