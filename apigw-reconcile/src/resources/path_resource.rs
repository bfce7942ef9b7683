//! Path resources of a REST API (`/`, `/pets`, `/pets/{id}`, ...).
//!
//! Each resource holds one path part under a parent. Creating a deep path
//! creates every missing ancestor first, in order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::accessor::RemoteResource;
use crate::error::{ReconcileError, Result};
use crate::state::Directive;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathResourceSpec {
    pub rest_api_id: String,
    /// Absolute resource path, e.g. `/pets/{id}`.
    #[serde(alias = "path")]
    pub name: String,
    #[serde(default)]
    pub state: Directive,
}

impl PathResourceSpec {
    pub fn validate(&self) -> Result<()> {
        if self.rest_api_id.trim().is_empty() {
            return Err(ReconcileError::config("rest_api_id", "must not be empty"));
        }
        if !self.name.starts_with('/') {
            return Err(ReconcileError::config(
                "name",
                format!("resource path '{}' must start with '/'", self.name),
            ));
        }
        if self.name.len() > 1 && (self.name.ends_with('/') || self.name.contains("//")) {
            return Err(ReconcileError::config(
                "name",
                format!("resource path '{}' has an empty part", self.name),
            ));
        }
        if self.name == "/" && self.state == Directive::Absent {
            return Err(ReconcileError::config(
                "name",
                "the root resource '/' cannot be removed",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResource {
    pub id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_part: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePathResourceRequest {
    pub parent_id: String,
    pub path_part: String,
}

impl RemoteResource for PathResource {
    type Create = CreatePathResourceRequest;

    const KIND: &'static str = "resource";
    const RESULT_KEY: &'static str = "resource";

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.path
    }
}

/// One missing path part, to be created under `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPart {
    pub part: String,
    pub path: String,
    pub parent: String,
}

/// Resources of one API keyed by path.
pub type PathMap = BTreeMap<String, PathResource>;

pub fn path_map(resources: Vec<PathResource>) -> PathMap {
    let mut map = PathMap::new();
    for resource in resources {
        map.entry(resource.path.clone()).or_insert(resource);
    }
    map
}

/// Ordered list of parts to create so that `path` exists.
pub fn plan_creation(existing: &PathMap, path: &str) -> Vec<PlannedPart> {
    let mut planned = Vec::new();
    let mut last = String::new();
    for part in path.split('/').skip(1) {
        let current = format!("{}/{}", last, part);
        if !existing.contains_key(&current) {
            planned.push(PlannedPart {
                part: part.to_string(),
                path: current.clone(),
                parent: if last.is_empty() {
                    "/".to_string()
                } else {
                    last.clone()
                },
            });
        }
        last = current;
    }
    planned
}

/// Full path of `part` under `parent`.
pub fn join_path(parent: &str, part: &str) -> String {
    if parent == "/" {
        format!("/{}", part)
    } else {
        format!("{}/{}", parent, part)
    }
}
