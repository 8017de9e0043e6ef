// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reading status fields out of arbitrary resources

use serde_json::Value;
use std::fmt;

/// Which part of a resource to observe while waiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProbe {
    /// A JSON pointer into the object, e.g. `/status/phase`
    Pointer(String),
    /// The `status` of the `.status.conditions[]` entry with this `type`
    Condition(String),
}

impl FieldProbe {
    pub fn pointer(pointer: impl Into<String>) -> Self {
        FieldProbe::Pointer(pointer.into())
    }

    pub fn condition(condition_type: impl Into<String>) -> Self {
        FieldProbe::Condition(condition_type.into())
    }
}

impl fmt::Display for FieldProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProbe::Pointer(p) => write!(f, "{}", p),
            FieldProbe::Condition(t) => write!(f, "condition {}", t),
        }
    }
}

/// Render a scalar JSON value the way `-o jsonpath` would print it
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Find the condition of the given type in `.status.conditions`
pub fn find_condition<'a>(object: &'a Value, condition_type: &str) -> Option<&'a Value> {
    object
        .pointer("/status/conditions")?
        .as_array()?
        .iter()
        .find(|c| c.get("type").and_then(Value::as_str) == Some(condition_type))
}

/// Read the probed field, `None` when it is absent
pub fn observe(object: &Value, probe: &FieldProbe) -> Option<String> {
    match probe {
        FieldProbe::Pointer(pointer) => object.pointer(pointer).and_then(scalar_to_string),
        FieldProbe::Condition(condition_type) => find_condition(object, condition_type)
            .and_then(|c| c.get("status"))
            .and_then(scalar_to_string),
    }
}

/// Check whether the condition of the given type has status "True"
pub fn condition_is_true(object: &Value, condition_type: &str) -> bool {
    observe(object, &FieldProbe::condition(condition_type)).as_deref() == Some("True")
}
