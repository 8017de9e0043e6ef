// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keep layered-product namespaces inside Central's platform component regex.
//!
//! Central classifies workloads as "platform" when their namespace matches
//! the regex of a platform component rule. The regex is a plain alternation
//! of anchored names (`^ns1$|^ns2$`), which we extend in place.

use crate::acs::api::AcsClient;
use crate::error::{Result, SetupError};
use serde_json::Value;
use tracing::{info, instrument};

/// Result of extending a namespace regex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexUpdate {
    pub regex: String,
    pub added: usize,
}

/// Append `^ns$` for every namespace not already an alternative of `regex`.
///
/// Existing alternatives keep their order and spelling. Running the result
/// through again with the same namespaces adds nothing.
pub fn append_namespaces<S: AsRef<str>>(regex: &str, namespaces: &[S]) -> RegexUpdate {
    let mut known: Vec<String> = regex.split('|').map(|a| a.trim().to_string()).collect();
    let mut appended = Vec::new();

    for namespace in namespaces {
        let namespace = namespace.as_ref().trim();
        if namespace.is_empty() {
            continue;
        }
        let alternative = format!("^{}$", namespace);
        if !known.contains(&alternative) {
            known.push(alternative.clone());
            appended.push(alternative);
        }
    }

    let added = appended.len();
    let regex = match (regex.is_empty(), appended.is_empty()) {
        (_, true) => regex.to_string(),
        (true, false) => appended.join("|"),
        (false, false) => format!("{}|{}", regex, appended.join("|")),
    };

    RegexUpdate { regex, added }
}

fn find_rule<'a>(config: &'a mut Value, rule_name: &str) -> Option<&'a mut Value> {
    config
        .pointer_mut("/platformComponentConfig/rules")?
        .as_array_mut()?
        .iter_mut()
        .find(|rule| {
            rule.get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.eq_ignore_ascii_case(rule_name))
        })
}

/// Rewrite the namespace regex of `rule_name` inside a Central config document
pub fn update_config(
    config: &mut Value,
    rule_name: &str,
    namespaces: &[String],
) -> Result<RegexUpdate> {
    let rule = find_rule(config, rule_name).ok_or_else(|| {
        SetupError::NotFound(format!("platform component rule '{}'", rule_name))
    })?;

    let current = rule
        .pointer("/namespaceRule/regex")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let update = append_namespaces(&current, namespaces);
    if update.added > 0 {
        rule["namespaceRule"]["regex"] = Value::String(update.regex.clone());
    }
    Ok(update)
}

/// Add namespaces to the layered products rule, writing only when something changed
#[instrument(skip(acs, namespaces))]
pub async fn add_layered_product_namespaces(
    acs: &AcsClient,
    rule_name: &str,
    namespaces: &[String],
) -> Result<RegexUpdate> {
    let mut config = acs.get_config().await?;
    let update = update_config(&mut config, rule_name, namespaces)?;

    if update.added == 0 {
        info!("All {} namespaces already in rule '{}'", namespaces.len(), rule_name);
        return Ok(update);
    }

    acs.put_config(&config).await?;
    info!(
        "Namespaces added = {} to rule '{}', regex is now {}",
        update.added, rule_name, update.regex
    );
    Ok(update)
}
