//! Deployments of a REST API to a stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::accessor::RemoteResource;
use crate::error::{ReconcileError, Result};

/// Cache cluster sizes accepted by the gateway, in GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheClusterSize {
    #[serde(rename = "0.5")]
    Gb0_5,
    #[serde(rename = "1.6")]
    Gb1_6,
    #[serde(rename = "6.1")]
    Gb6_1,
    #[serde(rename = "13.5")]
    Gb13_5,
    #[serde(rename = "28.4")]
    Gb28_4,
    #[serde(rename = "58.2")]
    Gb58_2,
    #[serde(rename = "118")]
    Gb118,
    #[serde(rename = "237")]
    Gb237,
}

impl CacheClusterSize {
    pub const ALL: [CacheClusterSize; 8] = [
        CacheClusterSize::Gb0_5,
        CacheClusterSize::Gb1_6,
        CacheClusterSize::Gb6_1,
        CacheClusterSize::Gb13_5,
        CacheClusterSize::Gb28_4,
        CacheClusterSize::Gb58_2,
        CacheClusterSize::Gb118,
        CacheClusterSize::Gb237,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheClusterSize::Gb0_5 => "0.5",
            CacheClusterSize::Gb1_6 => "1.6",
            CacheClusterSize::Gb6_1 => "6.1",
            CacheClusterSize::Gb13_5 => "13.5",
            CacheClusterSize::Gb28_4 => "28.4",
            CacheClusterSize::Gb58_2 => "58.2",
            CacheClusterSize::Gb118 => "118",
            CacheClusterSize::Gb237 => "237",
        }
    }
}

impl fmt::Display for CacheClusterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheClusterSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| {
                let choices: Vec<&str> = Self::ALL.iter().map(|size| size.as_str()).collect();
                format!(
                    "invalid cache cluster size '{}', expected one of {}",
                    s,
                    choices.join(", ")
                )
            })
    }
}

/// Request for a new deployment. Deployments are not idempotent: every
/// reconciliation of this spec creates one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentSpec {
    pub rest_api_id: String,
    /// Stage to deploy to.
    #[serde(alias = "stage_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stage_description: Option<String>,
    #[serde(default)]
    pub cache_cluster_enabled: bool,
    #[serde(default)]
    pub cache_cluster_size: Option<CacheClusterSize>,
}

impl DeploymentSpec {
    pub fn validate(&self) -> Result<()> {
        if self.rest_api_id.trim().is_empty() {
            return Err(ReconcileError::config("rest_api_id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(ReconcileError::config("name", "stage name must not be empty"));
        }
        if self.cache_cluster_enabled && self.cache_cluster_size.is_none() {
            return Err(ReconcileError::config(
                "cache_cluster_size",
                "is required when cache_cluster_enabled is set",
            ));
        }
        Ok(())
    }

    pub fn create_request(&self) -> CreateDeploymentRequest {
        CreateDeploymentRequest {
            stage_name: self.name.clone(),
            stage_description: self.stage_description.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            cache_cluster_enabled: self.cache_cluster_enabled,
            cache_cluster_size: if self.cache_cluster_enabled {
                self.cache_cluster_size
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub stage_name: String,
    pub stage_description: String,
    pub description: String,
    pub cache_cluster_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_cluster_size: Option<CacheClusterSize>,
}

impl RemoteResource for Deployment {
    type Create = CreateDeploymentRequest;

    const KIND: &'static str = "deployment";
    const RESULT_KEY: &'static str = "deployment";

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> DeploymentSpec {
        DeploymentSpec {
            rest_api_id: "abc123".to_string(),
            name: "prod".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_size_only_sent_when_enabled() {
        let mut spec = spec();
        spec.cache_cluster_size = Some(CacheClusterSize::Gb0_5);

        assert_eq!(
            serde_json::to_value(spec.create_request()).unwrap(),
            json!({
                "stageName": "prod",
                "stageDescription": "",
                "description": "",
                "cacheClusterEnabled": false,
            })
        );

        spec.cache_cluster_enabled = true;
        assert_eq!(
            serde_json::to_value(spec.create_request()).unwrap()["cacheClusterSize"],
            "0.5"
        );
    }

    #[test]
    fn test_enabled_cache_needs_a_size() {
        let mut spec = spec();
        spec.cache_cluster_enabled = true;
        assert!(matches!(
            spec.validate(),
            Err(ReconcileError::Configuration {
                field: "cache_cluster_size",
                ..
            })
        ));
    }

    #[test]
    fn test_cache_size_parsing() {
        assert_eq!("13.5".parse::<CacheClusterSize>(), Ok(CacheClusterSize::Gb13_5));
        let err = "2".parse::<CacheClusterSize>().unwrap_err();
        assert!(err.contains("0.5, 1.6"));

        let spec: DeploymentSpec = toml::from_str(
            r#"
            rest_api_id = "abc123"
            stage_name = "prod"
            cache_cluster_enabled = true
            cache_cluster_size = "237"
            "#,
        )
        .unwrap();
        assert_eq!(spec.cache_cluster_size, Some(CacheClusterSize::Gb237));
        assert_eq!(spec.name, "prod");
    }
}
