use anyhow::{Context, Result};
use apigw_reconcile::clients::Backend;
use apigw_reconcile::resources::{
    DeploymentSpec, DomainNameSpec, MethodSpec, PathResourceSpec, RestApiSpec,
};
use apigw_reconcile::{BackendConfig, Declaration, Deployer, PathReconciler, ResourceReconciler};
use serde_json::Value;
use tracing::info;

use crate::cli::{Cli, Commands, Request};
use crate::output;

pub async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Apply { config } => {
            let declaration = load(config).await?;
            apply(&cli, declaration, cli.simulate).await
        }
        Commands::Plan { config } => {
            let declaration = load(config).await?;
            apply(&cli, declaration, true).await
        }
        command => {
            let Some(request) = command.request() else {
                return Ok(());
            };
            let backend = Backend::from_config(&cli.backend_config(BackendConfig::default()))?;
            let report = reconcile(&backend, &request, cli.simulate).await?;
            output::print(&report)
        }
    }
}

async fn load(path: &std::path::Path) -> Result<Declaration> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let declaration = Declaration::from_toml_str(&source)?;
    declaration.validate()?;
    Ok(declaration)
}

/// Reconciles every declared resource in file order: REST APIs, domain
/// names, path resources, methods, then deployments. The first fatal error
/// stops the run.
async fn apply(cli: &Cli, declaration: Declaration, simulate: bool) -> Result<()> {
    let backend = Backend::from_config(&cli.backend_config(declaration.backend.clone()))?;
    info!(
        "Applying {} declared resources ({} backend{})",
        declaration.len(),
        backend.kind(),
        if simulate { ", simulate" } else { "" }
    );

    let requests = declaration
        .rest_apis
        .into_iter()
        .map(Request::RestApi)
        .chain(declaration.domain_names.into_iter().map(Request::DomainName))
        .chain(declaration.resources.into_iter().map(Request::Resource))
        .chain(declaration.methods.into_iter().map(Request::Method))
        .chain(declaration.deployments.into_iter().map(Request::Deployment));

    for request in requests {
        let report = reconcile(&backend, &request, simulate).await?;
        output::print(&report)?;
    }
    Ok(())
}

async fn reconcile(backend: &Backend, request: &Request, simulate: bool) -> Result<Value> {
    match request {
        Request::RestApi(spec) => rest_api(backend, spec, simulate).await,
        Request::DomainName(spec) => domain_name(backend, spec, simulate).await,
        Request::Resource(spec) => resource(backend, spec, simulate).await,
        Request::Method(spec) => method(backend, spec, simulate).await,
        Request::Deployment(spec) => deployment(backend, spec, simulate).await,
    }
}

async fn rest_api(backend: &Backend, spec: &RestApiSpec, simulate: bool) -> Result<Value> {
    let result = match backend {
        Backend::Memory(gateway) => {
            ResourceReconciler::new(&gateway.rest_apis)
                .reconcile(spec, simulate)
                .await?
        }
        #[cfg(feature = "http")]
        Backend::Http(http) => {
            ResourceReconciler::new(&http.rest_apis())
                .reconcile(spec, simulate)
                .await?
        }
    };
    output::report(&result)
}

async fn domain_name(backend: &Backend, spec: &DomainNameSpec, simulate: bool) -> Result<Value> {
    let result = match backend {
        Backend::Memory(gateway) => {
            ResourceReconciler::new(&gateway.domain_names)
                .reconcile(spec, simulate)
                .await?
        }
        #[cfg(feature = "http")]
        Backend::Http(http) => {
            ResourceReconciler::new(&http.domain_names())
                .reconcile(spec, simulate)
                .await?
        }
    };
    output::report(&result)
}

async fn resource(backend: &Backend, spec: &PathResourceSpec, simulate: bool) -> Result<Value> {
    let result = match backend {
        Backend::Memory(gateway) => {
            let resources = gateway.resources(&spec.rest_api_id).await;
            PathReconciler::new(&*resources)
                .reconcile(spec, simulate)
                .await?
        }
        #[cfg(feature = "http")]
        Backend::Http(http) => {
            PathReconciler::new(&http.resources(&spec.rest_api_id))
                .reconcile(spec, simulate)
                .await?
        }
    };
    output::report(&result)
}

async fn method(backend: &Backend, spec: &MethodSpec, simulate: bool) -> Result<Value> {
    let result = match backend {
        Backend::Memory(gateway) => {
            let methods = gateway.methods(&spec.rest_api_id, &spec.resource_id).await;
            ResourceReconciler::new(&*methods)
                .reconcile(spec, simulate)
                .await?
        }
        #[cfg(feature = "http")]
        Backend::Http(http) => {
            ResourceReconciler::new(&http.methods(&spec.rest_api_id, &spec.resource_id))
                .reconcile(spec, simulate)
                .await?
        }
    };
    output::report(&result)
}

async fn deployment(backend: &Backend, spec: &DeploymentSpec, simulate: bool) -> Result<Value> {
    let result = match backend {
        Backend::Memory(gateway) => {
            let deployments = gateway.deployments(&spec.rest_api_id).await;
            Deployer::new(&*deployments)
                .deploy(spec, simulate)
                .await?
        }
        #[cfg(feature = "http")]
        Backend::Http(http) => {
            Deployer::new(&http.deployments(&spec.rest_api_id))
                .deploy(spec, simulate)
                .await?
        }
    };
    output::report(&result)
}
