// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compliance scan schedules through the RHACS v2 compliance API

use crate::acs::api::AcsClient;
use crate::config::ComplianceSettings;
use crate::error::{Result, SetupError};
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Body of a daily scan configuration covering `cluster_ids`
pub fn scan_configuration(settings: &ComplianceSettings, cluster_ids: &[String]) -> Value {
    json!({
        "scanName": settings.scan_name,
        "scanConfig": {
            "oneTimeScan": false,
            "profiles": settings.profiles,
            "scanSchedule": {
                "intervalType": "DAILY",
                "timeOfDay": {
                    "hours": settings.hour,
                    "minutes": settings.minute
                }
            },
            "description": settings.description
        },
        "clusters": cluster_ids
    })
}

/// Create the scan schedule unless one with the same name exists.
///
/// Returns `true` when a new schedule was created.
#[instrument(skip_all, fields(scan = %settings.scan_name))]
pub async fn ensure_scan_schedule(acs: &AcsClient, settings: &ComplianceSettings) -> Result<bool> {
    if acs
        .scan_configuration_names()
        .await?
        .iter()
        .any(|name| name == &settings.scan_name)
    {
        info!("Scan configuration {} already exists", settings.scan_name);
        return Ok(false);
    }

    let cluster_ids: Vec<String> = acs.clusters().await?.into_iter().map(|c| c.id).collect();
    if cluster_ids.is_empty() {
        return Err(SetupError::NotFound(
            "no secured clusters in Central to schedule scans for".to_string(),
        ));
    }

    acs.create_scan_configuration(&scan_configuration(settings, &cluster_ids))
        .await?;
    info!(
        "Created daily scan {} at {:02}:{:02} for {} cluster(s)",
        settings.scan_name,
        settings.hour,
        settings.minute,
        cluster_ids.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_configuration_body() {
        let body = scan_configuration(&ComplianceSettings::default(), &["c1".to_string()]);

        assert_eq!(body["scanName"], "daily-cis-scan");
        assert_eq!(body["scanConfig"]["oneTimeScan"], false);
        assert_eq!(body["scanConfig"]["scanSchedule"]["intervalType"], "DAILY");
        assert_eq!(body["scanConfig"]["scanSchedule"]["timeOfDay"]["hours"], 12);
        assert_eq!(body["scanConfig"]["profiles"][1], "ocp4-cis-node");
        assert_eq!(body["clusters"][0], "c1");
    }
}
