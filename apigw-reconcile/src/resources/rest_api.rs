//! REST API resources.

use serde::{Deserialize, Serialize};

use crate::accessor::{DesiredState, RemoteResource};
use crate::error::{ReconcileError, Result};
use crate::patch::{PatchOp, diff_string};
use crate::state::Directive;

/// Desired state of a REST API, identified by its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestApiSpec {
    pub name: String,
    /// Unset means "no description"; compared as the empty string.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Directive,
}

/// A REST API as held by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApi {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRestApiRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RemoteResource for RestApi {
    type Create = CreateRestApiRequest;

    const KIND: &'static str = "rest api";
    const RESULT_KEY: &'static str = "api";

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.name
    }
}

impl DesiredState for RestApiSpec {
    type Resource = RestApi;

    fn key(&self) -> &str {
        &self.name
    }

    fn directive(&self) -> Directive {
        self.state
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReconcileError::config("name", "must not be empty"));
        }
        Ok(())
    }

    fn patches(&self, remote: &RestApi) -> Vec<PatchOp> {
        let mut patches = Vec::new();
        diff_string(&mut patches, "name", Some(&remote.name), Some(&self.name));
        diff_string(
            &mut patches,
            "description",
            remote.description.as_deref(),
            self.description.as_deref(),
        );
        patches
    }

    fn create_request(&self) -> CreateRestApiRequest {
        CreateRestApiRequest {
            name: self.name.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
        }
    }
}
