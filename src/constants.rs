// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "opsetup";

/// Poller defaults
pub mod wait {
    /// Seconds between two polls
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Total budget in seconds before giving up
    pub const TIMEOUT_SECS: u64 = 600;
    /// Log a progress line every this many polls
    pub const PROGRESS_EVERY: u32 = 6;
}

/// OLM catalog defaults
pub mod olm {
    pub const DEFAULT_SOURCE: &str = "redhat-operators";
    pub const DEFAULT_SOURCE_NAMESPACE: &str = "openshift-marketplace";
    /// Namespace holding the cluster-wide OperatorGroup
    pub const GLOBAL_OPERATORS_NAMESPACE: &str = "openshift-operators";
    pub const CSV_SUCCEEDED: &str = "Succeeded";
}

/// Names fixed by the RHACS operator
pub mod acs {
    pub const CENTRAL_ROUTE: &str = "central";
    pub const HTPASSWD_SECRET: &str = "central-htpasswd";
    pub const HTPASSWD_PASSWORD_KEY: &str = "password";
    pub const ADMIN_USER: &str = "admin";
    pub const DEPLOYED_CONDITION: &str = "Deployed";
    pub const PASSTHROUGH: &str = "passthrough";
    pub const HEALTHY: &str = "HEALTHY";
}

/// Keys written to the state file and exported to the shell
pub mod env {
    pub const ROX_API_TOKEN: &str = "ROX_API_TOKEN";
    pub const ROX_CENTRAL_ADDRESS: &str = "ROX_CENTRAL_ADDRESS";
    pub const ACS_PORTAL_USERNAME: &str = "ACS_PORTAL_USERNAME";
    pub const ACS_PORTAL_PASSWORD: &str = "ACS_PORTAL_PASSWORD";
    pub const TUTORIAL_HOME: &str = "TUTORIAL_HOME";
    pub const GRPC_ENFORCE_ALPN_ENABLED: &str = "GRPC_ENFORCE_ALPN_ENABLED";
}
