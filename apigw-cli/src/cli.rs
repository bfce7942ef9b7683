use std::path::PathBuf;

use apigw_reconcile::resources::{
    CacheClusterSize, DeploymentSpec, DomainNameSpec, MethodSpec, PathResourceSpec, RequestModel,
    RequestParam, RestApiSpec,
};
use apigw_reconcile::{BackendConfig, BackendKind, Directive};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "apigw", version)]
#[command(about = "Reconcile API gateway resources with their declared state", long_about = None)]
pub struct Cli {
    /// Where remote state lives: http or memory
    #[arg(long, global = true, env = "APIGW_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Control plane endpoint for the http backend
    #[arg(long, global = true, env = "APIGW_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Items requested per listing page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Report what would change without changing anything
    #[arg(long, visible_alias = "check", global = true)]
    pub simulate: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile a REST API, matched by name
    RestApi {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value_t = Directive::Present)]
        state: Directive,
    },

    /// Reconcile a custom domain name
    DomainName {
        #[arg(long)]
        name: String,

        #[arg(long)]
        cert_name: Option<String>,

        /// Certificate body (PEM)
        #[arg(long)]
        cert_body: Option<String>,

        #[arg(long)]
        cert_private_key: Option<String>,

        #[arg(long)]
        cert_chain: Option<String>,

        #[arg(long, default_value_t = Directive::Present)]
        state: Directive,
    },

    /// Reconcile a path resource of a REST API, creating missing parents
    Resource {
        #[arg(long)]
        rest_api_id: String,

        /// Absolute path, e.g. /pets/{id}
        #[arg(long, alias = "name")]
        path: String,

        #[arg(long, default_value_t = Directive::Present)]
        state: Directive,
    },

    /// Reconcile an HTTP method of a path resource
    Method {
        #[arg(long)]
        rest_api_id: String,

        #[arg(long)]
        resource_id: String,

        /// HTTP verb: GET, PUT, POST, DELETE, PATCH, HEAD, ANY or OPTIONS
        #[arg(long, alias = "method")]
        name: String,

        #[arg(long, default_value = "NONE")]
        authorization_type: String,

        #[arg(long)]
        authorizer_id: Option<String>,

        #[arg(long)]
        api_key_required: bool,

        /// Request parameter as location.name[=required], e.g. querystring.page=true
        #[arg(long = "request-param")]
        request_params: Vec<RequestParam>,

        /// Request model as content_type=model, e.g. application/json=Empty
        #[arg(long = "request-model")]
        request_models: Vec<RequestModel>,

        #[arg(long, default_value_t = Directive::Present)]
        state: Directive,
    },

    /// Create a deployment of a REST API to a stage
    Deployment {
        #[arg(long)]
        rest_api_id: String,

        #[arg(long)]
        stage_name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        stage_description: Option<String>,

        #[arg(long)]
        cache_cluster_enabled: bool,

        /// Cache size in GB: 0.5, 1.6, 6.1, 13.5, 28.4, 58.2, 118 or 237
        #[arg(long)]
        cache_cluster_size: Option<CacheClusterSize>,
    },

    /// Reconcile every resource of a declaration file
    Apply {
        /// TOML declaration file
        config: PathBuf,
    },

    /// Like apply, without changing anything
    Plan {
        config: PathBuf,
    },
}

impl Cli {
    /// Applies command line overrides on top of `base`.
    pub fn backend_config(&self, base: BackendConfig) -> BackendConfig {
        BackendConfig {
            kind: self.backend.unwrap_or(base.kind),
            endpoint: self.endpoint.clone().or(base.endpoint),
            timeout_secs: self.timeout.unwrap_or(base.timeout_secs),
            page_size: self.page_size.unwrap_or(base.page_size),
        }
    }
}

/// A single-resource request built from command line flags.
#[derive(Debug)]
pub enum Request {
    RestApi(RestApiSpec),
    DomainName(DomainNameSpec),
    Resource(PathResourceSpec),
    Method(MethodSpec),
    Deployment(DeploymentSpec),
}

impl Commands {
    /// The single-resource request, or `None` for declaration file commands.
    pub fn request(&self) -> Option<Request> {
        let request = match self {
            Commands::RestApi {
                name,
                description,
                state,
            } => Request::RestApi(RestApiSpec {
                name: name.clone(),
                description: description.clone(),
                state: *state,
            }),
            Commands::DomainName {
                name,
                cert_name,
                cert_body,
                cert_private_key,
                cert_chain,
                state,
            } => Request::DomainName(DomainNameSpec {
                name: name.clone(),
                cert_name: cert_name.clone(),
                cert_body: cert_body.clone(),
                cert_private_key: cert_private_key.clone(),
                cert_chain: cert_chain.clone(),
                state: *state,
            }),
            Commands::Resource {
                rest_api_id,
                path,
                state,
            } => Request::Resource(PathResourceSpec {
                rest_api_id: rest_api_id.clone(),
                name: path.clone(),
                state: *state,
            }),
            Commands::Method {
                rest_api_id,
                resource_id,
                name,
                authorization_type,
                authorizer_id,
                api_key_required,
                request_params,
                request_models,
                state,
            } => Request::Method(MethodSpec {
                rest_api_id: rest_api_id.clone(),
                resource_id: resource_id.clone(),
                name: name.clone(),
                authorization_type: authorization_type.clone(),
                authorizer_id: authorizer_id.clone(),
                api_key_required: *api_key_required,
                request_params: request_params.clone(),
                request_models: request_models.clone(),
                state: *state,
            }),
            Commands::Deployment {
                rest_api_id,
                stage_name,
                description,
                stage_description,
                cache_cluster_enabled,
                cache_cluster_size,
            } => Request::Deployment(DeploymentSpec {
                rest_api_id: rest_api_id.clone(),
                name: stage_name.clone(),
                description: description.clone(),
                stage_description: stage_description.clone(),
                cache_cluster_enabled: *cache_cluster_enabled,
                cache_cluster_size: *cache_cluster_size,
            }),
            Commands::Apply { .. } | Commands::Plan { .. } => return None,
        };
        Some(request)
    }
}
