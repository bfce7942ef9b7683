//! Partial-update patch operations.
//!
//! Updates never resend a whole record: the reconciler sends a list of
//! `add` / `remove` / `replace` operations addressed by a JSON pointer, so a
//! request model keyed by `application/json` lives at
//! `/requestModels/application~1json`. Values travel as strings on the wire.

use std::collections::BTreeMap;

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, PatchOperation, RemoveOperation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Remove,
    Replace,
}

/// A single patch operation as the gateway accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PatchOp {
    fn new(op: PatchOpKind, tokens: &[&str], value: Option<String>) -> Self {
        Self {
            op,
            path: PointerBuf::from_tokens(tokens.iter().copied()).to_string(),
            value,
        }
    }

    pub fn replace(field: &str, value: impl Into<String>) -> Self {
        Self::new(PatchOpKind::Replace, &[field], Some(value.into()))
    }

    pub fn add(field: &str, value: impl Into<String>) -> Self {
        Self::new(PatchOpKind::Add, &[field], Some(value.into()))
    }

    pub fn remove(field: &str) -> Self {
        Self::new(PatchOpKind::Remove, &[field], None)
    }

    /// Operation on a key inside a map-valued field, e.g. `/requestModels/application~1json`.
    pub fn nested(op: PatchOpKind, prefix: &str, key: &str, value: Option<String>) -> Self {
        Self::new(op, &[prefix, key], value)
    }

    /// The equivalent RFC 6902 operation.
    ///
    /// The gateway treats `replace` on a missing member like `add`, which is
    /// what an RFC 6902 `add` on an object member does.
    pub fn to_operation(&self) -> Result<PatchOperation, RemoteError> {
        let path = PointerBuf::parse(self.path.as_str())
            .map_err(|e| invalid(format!("invalid patch path '{}': {}", self.path, e)))?;
        if path.is_root() {
            return Err(invalid(format!("empty patch path '{}'", self.path)));
        }

        match self.op {
            PatchOpKind::Add | PatchOpKind::Replace => {
                let value = self.value.clone().ok_or_else(|| {
                    invalid(format!("{:?} on '{}' needs a value", self.op, self.path))
                })?;
                Ok(PatchOperation::Add(AddOperation {
                    path,
                    value: Value::String(value),
                }))
            }
            PatchOpKind::Remove => Ok(PatchOperation::Remove(RemoveOperation { path })),
        }
    }
}

/// Applies `patches` to the JSON form of a record, all or nothing.
pub fn apply(target: &mut Value, patches: &[PatchOp]) -> Result<(), RemoteError> {
    let operations = patches
        .iter()
        .map(PatchOp::to_operation)
        .collect::<Result<Vec<_>, _>>()?;
    json_patch::patch(target, &operations).map_err(|e| invalid(e.to_string()))
}

fn invalid(message: String) -> RemoteError {
    RemoteError::Service {
        status: 400,
        message,
    }
}

/// Pushes a `replace` when two string fields differ.
///
/// A field absent on either side compares as the empty string, and an absent
/// desired value is sent as `""`.
pub fn diff_string(
    patches: &mut Vec<PatchOp>,
    field: &str,
    remote: Option<&str>,
    desired: Option<&str>,
) {
    let remote = remote.unwrap_or_default();
    let desired = desired.unwrap_or_default();
    if remote != desired {
        patches.push(PatchOp::replace(field, desired));
    }
}

/// Pushes `add`, `remove` or `replace` for a scalar field that may be
/// missing on either side. Values compare case-insensitively.
pub fn diff_field(
    patches: &mut Vec<PatchOp>,
    field: &str,
    remote: Option<&str>,
    desired: Option<&str>,
) {
    match (remote, desired) {
        (None, None) => {}
        (Some(_), None) => patches.push(PatchOp::remove(field)),
        (None, Some(desired)) => patches.push(PatchOp::add(field, desired)),
        (Some(remote), Some(desired)) => {
            if !remote.eq_ignore_ascii_case(desired) {
                patches.push(PatchOp::replace(field, desired));
            }
        }
    }
}

/// Two-way comparison of a map-valued field: declared keys are added or
/// replaced, remote keys no longer declared are removed.
pub fn diff_map(
    patches: &mut Vec<PatchOp>,
    prefix: &str,
    remote: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
) {
    for (key, value) in desired {
        match remote.get(key) {
            None => patches.push(PatchOp::nested(
                PatchOpKind::Add,
                prefix,
                key,
                Some(value.clone()),
            )),
            Some(current) if current != value => patches.push(PatchOp::nested(
                PatchOpKind::Replace,
                prefix,
                key,
                Some(value.clone()),
            )),
            Some(_) => {}
        }
    }
    for key in remote.keys().filter(|k| !desired.contains_key(*k)) {
        patches.push(PatchOp::nested(PatchOpKind::Remove, prefix, key, None));
    }
}
