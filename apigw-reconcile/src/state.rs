//! Lifecycle directive and reconciliation outcome.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whether a declared resource should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Present => f.write_str("present"),
            Directive::Absent => f.write_str("absent"),
        }
    }
}

impl FromStr for Directive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Directive::Present),
            "absent" => Ok(Directive::Absent),
            other => Err(format!(
                "invalid state '{}', expected 'present' or 'absent'",
                other
            )),
        }
    }
}

/// Terminal branch taken by a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    Noop,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult<R> {
    pub changed: bool,
    pub action: Action,
    pub resource: Option<R>,
}

impl<R> ReconciliationResult<R> {
    pub fn unchanged(resource: Option<R>) -> Self {
        Self {
            changed: false,
            action: Action::Noop,
            resource,
        }
    }

    pub fn changed(action: Action, resource: Option<R>) -> Self {
        Self {
            changed: true,
            action,
            resource,
        }
    }
}

impl<R: Serialize> ReconciliationResult<R> {
    /// Renders the caller-facing report: `{"changed": bool, "<key>": resource-or-null}`.
    pub fn report(&self, key: &str) -> serde_json::Result<Value> {
        let mut out = Map::new();
        out.insert("changed".to_string(), Value::Bool(self.changed));
        out.insert(key.to_string(), serde_json::to_value(&self.resource)?);
        Ok(Value::Object(out))
    }
}
