//! Declaration files.
//!
//! ```toml
//! [backend]
//! kind = "http"
//! endpoint = "http://127.0.0.1:4566/apigateway"
//!
//! [[rest_apis]]
//! name = "docs.example.io"
//! description = "v1"
//!
//! [[domain_names]]
//! name = "api.example.io"
//! state = "absent"
//!
//! [[resources]]
//! rest_api_id = "c8888abcde"
//! name = "/pets/{id}"
//!
//! [[methods]]
//! rest_api_id = "c8888abcde"
//! resource_id = "r3s0urce01"
//! name = "GET"
//!
//! [[deployments]]
//! rest_api_id = "c8888abcde"
//! name = "prod"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::accessor::DesiredState;
use crate::error::{ReconcileError, Result};
use crate::resources::{DeploymentSpec, DomainNameSpec, MethodSpec, PathResourceSpec, RestApiSpec};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Http,
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Http => f.write_str("http"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "http" => Ok(BackendKind::Http),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!(
                "invalid backend '{}', expected 'http' or 'memory'",
                other
            )),
        }
    }
}

/// Where remote state lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Per-request timeout of the http accessor.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// A set of declared resources plus backend settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub rest_apis: Vec<RestApiSpec>,
    #[serde(default)]
    pub domain_names: Vec<DomainNameSpec>,
    #[serde(default)]
    pub resources: Vec<PathResourceSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    #[serde(default)]
    pub deployments: Vec<DeploymentSpec>,
}

impl Declaration {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ReconcileError::config("declaration", e.to_string()))
    }

    /// Validates every entry so a bad entry is reported before any remote call.
    pub fn validate(&self) -> Result<()> {
        for spec in &self.rest_apis {
            spec.validate()?;
        }
        for spec in &self.domain_names {
            spec.validate()?;
        }
        for spec in &self.resources {
            spec.validate()?;
        }
        for spec in &self.methods {
            spec.validate()?;
        }
        for spec in &self.deployments {
            spec.validate()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rest_apis.len()
            + self.domain_names.len()
            + self.resources.len()
            + self.methods.len()
            + self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
