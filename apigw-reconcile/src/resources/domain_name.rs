//! Custom domain names.
//!
//! The gateway never returns certificate material, so only the certificate
//! name is tracked for drift. Body, private key and chain are sent on create
//! when given; every certificate field is optional.

use serde::{Deserialize, Serialize};

use crate::accessor::{DesiredState, RemoteResource};
use crate::error::{ReconcileError, Result};
use crate::patch::{PatchOp, diff_string};
use crate::state::Directive;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainNameSpec {
    #[serde(alias = "domain_name")]
    pub name: String,
    #[serde(default)]
    pub cert_name: Option<String>,
    #[serde(default)]
    pub cert_body: Option<String>,
    #[serde(default)]
    pub cert_private_key: Option<String>,
    #[serde(default)]
    pub cert_chain: Option<String>,
    #[serde(default)]
    pub state: Directive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainName {
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_domain_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomainNameRequest {
    pub domain_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<String>,
}

impl RemoteResource for DomainName {
    type Create = CreateDomainNameRequest;

    const KIND: &'static str = "domain name";
    const RESULT_KEY: &'static str = "domain_name";
    const KEY_IS_ID: bool = true;

    fn id(&self) -> &str {
        &self.domain_name
    }

    fn key(&self) -> &str {
        &self.domain_name
    }
}

impl DesiredState for DomainNameSpec {
    type Resource = DomainName;

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

    fn patches(&self, remote: &DomainName) -> Vec<PatchOp> {
        let mut patches = Vec::new();
        diff_string(
            &mut patches,
            "certificateName",
            remote.certificate_name.as_deref(),
            self.cert_name.as_deref(),
        );
        patches
    }

    fn create_request(&self) -> CreateDomainNameRequest {
        CreateDomainNameRequest {
            domain_name: self.name.clone(),
            certificate_name: self.cert_name.clone(),
            certificate_body: self.cert_body.clone(),
            certificate_private_key: self.cert_private_key.clone(),
            certificate_chain: self.cert_chain.clone(),
        }
    }
}
