//! HTTP methods of a path resource (`GET /pets`, `POST /pets/{id}`, ...).
//!
//! A method is addressed by its verb under one resource and created with a
//! `PUT` to that address. Drift is tracked on the authorization settings,
//! the API key flag, the request parameters and the request models.
//! Integrations and responses are not managed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::accessor::{DesiredState, RemoteResource};
use crate::error::{ReconcileError, Result};
use crate::patch::{PatchOp, diff_field, diff_map};
use crate::state::Directive;

pub const HTTP_METHODS: [&str; 8] = ["GET", "PUT", "POST", "DELETE", "PATCH", "HEAD", "ANY", "OPTIONS"];

const AUTHORIZATION_NONE: &str = "NONE";
const AUTHORIZATION_CUSTOM: &str = "CUSTOM";

/// Where in the request a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Querystring,
    Path,
    Header,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Querystring => "querystring",
            ParamLocation::Path => "path",
            ParamLocation::Header => "header",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamLocation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "querystring" => Ok(ParamLocation::Querystring),
            "path" => Ok(ParamLocation::Path),
            "header" => Ok(ParamLocation::Header),
            other => Err(format!(
                "invalid parameter location '{}', expected querystring, path or header",
                other
            )),
        }
    }
}

/// A request parameter the method accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestParam {
    pub name: String,
    pub location: ParamLocation,
    #[serde(default)]
    pub param_required: bool,
}

impl RequestParam {
    /// Key under which the gateway stores the parameter,
    /// e.g. `method.request.querystring.page`.
    pub fn key(&self) -> String {
        format!("method.request.{}.{}", self.location, self.name)
    }
}

/// `location.name` or `location.name=required`, e.g. `querystring.page=true`.
impl FromStr for RequestParam {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (param, required) = match s.split_once('=') {
            Some((param, required)) => (
                param,
                required
                    .parse::<bool>()
                    .map_err(|_| format!("invalid required flag '{}' in '{}'", required, s))?,
            ),
            None => (s, false),
        };
        let (location, name) = param
            .split_once('.')
            .ok_or_else(|| format!("expected location.name, got '{}'", s))?;
        Ok(RequestParam {
            name: name.to_string(),
            location: location.parse()?,
            param_required: required,
        })
    }
}

/// A model attached to the method request for one content type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestModel {
    pub content_type: String,
    pub model: String,
}

/// `content_type=model`, e.g. `application/json=Empty`.
impl FromStr for RequestModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (content_type, model) = s
            .split_once('=')
            .ok_or_else(|| format!("expected content_type=model, got '{}'", s))?;
        Ok(RequestModel {
            content_type: content_type.to_string(),
            model: model.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodSpec {
    pub rest_api_id: String,
    pub resource_id: String,
    /// HTTP verb, one of [`HTTP_METHODS`].
    #[serde(alias = "method")]
    pub name: String,
    #[serde(default = "default_authorization_type")]
    pub authorization_type: String,
    /// Required when `authorization_type` is `CUSTOM`.
    #[serde(default)]
    pub authorizer_id: Option<String>,
    #[serde(default)]
    pub api_key_required: bool,
    #[serde(default)]
    pub request_params: Vec<RequestParam>,
    #[serde(default)]
    pub request_models: Vec<RequestModel>,
    #[serde(default)]
    pub state: Directive,
}

fn default_authorization_type() -> String {
    AUTHORIZATION_NONE.to_string()
}

impl Default for MethodSpec {
    fn default() -> Self {
        Self {
            rest_api_id: String::new(),
            resource_id: String::new(),
            name: String::new(),
            authorization_type: default_authorization_type(),
            authorizer_id: None,
            api_key_required: false,
            request_params: Vec::new(),
            request_models: Vec::new(),
            state: Directive::default(),
        }
    }
}

impl MethodSpec {
    fn request_parameters(&self) -> BTreeMap<String, bool> {
        self.request_params
            .iter()
            .map(|p| (p.key(), p.param_required))
            .collect()
    }

    fn request_models(&self) -> BTreeMap<String, String> {
        self.request_models
            .iter()
            .map(|m| (m.content_type.clone(), m.model.clone()))
            .collect()
    }

    fn tracks_authorizer(&self) -> bool {
        !self.authorization_type.eq_ignore_ascii_case(AUTHORIZATION_NONE)
    }
}

/// A method as held by the gateway.
///
/// Flags come back as booleans from a read but as `"true"`/`"false"` after
/// a patch has been applied, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_required: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub request_parameters: BTreeMap<String, bool>,
    #[serde(default)]
    pub request_models: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn into_bool<E: serde::de::Error>(self) -> std::result::Result<bool, E> {
        match self {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Flag::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            Flag::Text(s) => Err(E::custom(format!("expected a boolean, got '{}'", s))),
        }
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Flag>::deserialize(deserializer)?
        .map(Flag::into_bool)
        .transpose()
}

fn deserialize_flags<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Flag>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, flag)| flag.into_bool().map(|b| (key, b)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMethodRequest {
    pub http_method: String,
    pub authorization_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_id: Option<String>,
    pub api_key_required: bool,
    pub request_parameters: BTreeMap<String, bool>,
    pub request_models: BTreeMap<String, String>,
}

impl RemoteResource for Method {
    type Create = CreateMethodRequest;

    const KIND: &'static str = "method";
    const RESULT_KEY: &'static str = "method";
    const KEY_IS_ID: bool = true;

    fn id(&self) -> &str {
        &self.http_method
    }

    fn key(&self) -> &str {
        &self.http_method
    }

    fn put_key(request: &CreateMethodRequest) -> Option<&str> {
        Some(&request.http_method)
    }
}

impl DesiredState for MethodSpec {
    type Resource = Method;

    fn key(&self) -> &str {
        &self.name
    }

    fn directive(&self) -> Directive {
        self.state
    }

    fn validate(&self) -> Result<()> {
        if self.rest_api_id.trim().is_empty() {
            return Err(ReconcileError::config("rest_api_id", "must not be empty"));
        }
        if self.resource_id.trim().is_empty() {
            return Err(ReconcileError::config("resource_id", "must not be empty"));
        }
        if !HTTP_METHODS.contains(&self.name.as_str()) {
            return Err(ReconcileError::config(
                "name",
                format!(
                    "invalid method '{}', expected one of {}",
                    self.name,
                    HTTP_METHODS.join(", ")
                ),
            ));
        }
        if self.authorization_type.eq_ignore_ascii_case(AUTHORIZATION_CUSTOM)
            && self.authorizer_id.as_deref().is_none_or(str::is_empty)
        {
            return Err(ReconcileError::config(
                "authorizer_id",
                "is required when authorization_type is CUSTOM",
            ));
        }
        if let Some(param) = self.request_params.iter().find(|p| p.name.is_empty()) {
            return Err(ReconcileError::config(
                "request_params",
                format!("{} parameter without a name", param.location),
            ));
        }
        if self.request_models.iter().any(|m| m.content_type.is_empty()) {
            return Err(ReconcileError::config(
                "request_models",
                "model without a content type",
            ));
        }
        Ok(())
    }

    fn patches(&self, remote: &Method) -> Vec<PatchOp> {
        let mut patches = Vec::new();
        diff_field(
            &mut patches,
            "authorizationType",
            remote.authorization_type.as_deref(),
            Some(self.authorization_type.as_str()),
        );
        diff_field(
            &mut patches,
            "apiKeyRequired",
            remote.api_key_required.map(bool_str),
            Some(bool_str(self.api_key_required)),
        );
        if self.tracks_authorizer() {
            match (remote.authorizer_id.as_deref(), self.authorizer_id.as_deref()) {
                (_, Some(desired)) if remote.authorizer_id.as_deref() != Some(desired) => {
                    patches.push(PatchOp::replace("authorizerId", desired));
                }
                (Some(_), None) => patches.push(PatchOp::remove("authorizerId")),
                _ => {}
            }
        }

        diff_map(
            &mut patches,
            "requestModels",
            &remote.request_models,
            &self.request_models(),
        );
        diff_map(
            &mut patches,
            "requestParameters",
            &stringify(&remote.request_parameters),
            &stringify(&self.request_parameters()),
        );
        patches
    }

    fn create_request(&self) -> CreateMethodRequest {
        CreateMethodRequest {
            http_method: self.name.clone(),
            authorization_type: self.authorization_type.clone(),
            authorizer_id: self.authorizer_id.clone(),
            api_key_required: self.api_key_required,
            request_parameters: self.request_parameters(),
            request_models: self.request_models(),
        }
    }
}

fn bool_str(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

fn stringify(flags: &BTreeMap<String, bool>) -> BTreeMap<String, String> {
    flags
        .iter()
        .map(|(k, v)| (k.clone(), bool_str(*v).to_string()))
        .collect()
}
