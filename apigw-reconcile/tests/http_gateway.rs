//! Reconciliation through the HTTP accessor against a mock gateway.

#![cfg(feature = "http")]

mod common;

use apigw_reconcile::clients::HttpCollection;
use apigw_reconcile::resources::{
    DeploymentSpec, DomainNameSpec, MethodSpec, PathResourceSpec, RequestModel, RequestParam,
    RestApi, RestApiSpec,
};
use apigw_reconcile::{
    Deployer, Directive, ErrorKind, PathReconciler, RemoteAccessor, RemoteError,
    ResourceReconciler,
};
use axum::http::{Method, StatusCode};
use common::MockGateway;
use serde_json::json;

fn api_spec(description: Option<&str>, state: Directive) -> RestApiSpec {
    RestApiSpec {
        name: "docs.example.io".to_string(),
        description: description.map(|s| s.to_string()),
        state,
    }
}

#[tokio::test]
async fn test_list_follows_pagination() {
    let gateway = MockGateway::spawn().await;
    gateway.seed(
        "restapis",
        (0..7)
            .map(|i| json!({"id": format!("api{}", i), "name": format!("api-{}", i)}))
            .collect(),
    );

    let apis: HttpCollection<RestApi> = gateway.backend(3).collection("restapis");
    let items = apis.list().await.unwrap();
    assert_eq!(items.len(), 7);
    assert_eq!(items[6].name, "api-6");

    let positions: Vec<Option<String>> = gateway
        .requests()
        .iter()
        .map(|r| r.query.get("position").cloned())
        .collect();
    assert_eq!(
        positions,
        vec![None, Some("3".to_string()), Some("6".to_string())]
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_rest_api_lifecycle() {
    let gateway = MockGateway::spawn().await;
    let apis = gateway.backend(25).rest_apis();
    let reconciler = ResourceReconciler::new(&apis);

    let created = reconciler
        .reconcile(&api_spec(Some("v1"), Directive::Present), false)
        .await
        .unwrap();
    assert!(created.changed);
    let id = created.resource.unwrap().id;

    let unchanged = reconciler
        .reconcile(&api_spec(Some("v1"), Directive::Present), false)
        .await
        .unwrap();
    assert!(!unchanged.changed);

    gateway.clear_requests();
    let updated = reconciler
        .reconcile(&api_spec(Some("v2"), Directive::Present), false)
        .await
        .unwrap();
    assert!(updated.changed);
    assert_eq!(updated.resource.unwrap().description.as_deref(), Some("v2"));

    let mutating = gateway.mutating_requests();
    assert_eq!(mutating.len(), 1);
    assert_eq!(mutating[0].method, Method::PATCH);
    assert_eq!(mutating[0].path, format!("restapis/{}", id));
    assert_eq!(
        mutating[0].body,
        Some(json!({
            "patchOperations": [{"op": "replace", "path": "/description", "value": "v2"}]
        }))
    );

    let deleted = reconciler
        .reconcile(&api_spec(None, Directive::Absent), false)
        .await
        .unwrap();
    assert!(deleted.changed);
    assert!(gateway.items("restapis").is_empty());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_create_body_matches_declared_attributes() {
    let gateway = MockGateway::spawn().await;
    let apis = gateway.backend(25).rest_apis();

    ResourceReconciler::new(&apis)
        .reconcile(&api_spec(Some("v1"), Directive::Present), false)
        .await
        .unwrap();

    let mutating = gateway.mutating_requests();
    assert_eq!(mutating.len(), 1);
    assert_eq!(mutating[0].method, Method::POST);
    assert_eq!(
        mutating[0].body,
        Some(json!({"name": "docs.example.io", "description": "v1"}))
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_simulate_sends_only_reads() {
    let gateway = MockGateway::spawn().await;
    gateway.seed(
        "restapis",
        vec![json!({"id": "c8888abcde", "name": "docs.example.io", "description": "v1"})],
    );
    let apis = gateway.backend(25).rest_apis();

    let result = ResourceReconciler::new(&apis)
        .reconcile(&api_spec(Some("v2"), Directive::Present), true)
        .await
        .unwrap();
    assert!(result.changed);
    assert_eq!(result.resource.unwrap().description.as_deref(), Some("v1"));
    assert!(gateway.mutating_requests().is_empty());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_service_error_is_reported_with_operation() {
    let gateway = MockGateway::spawn().await;
    let apis = gateway.backend(25).rest_apis();
    gateway.fail_next(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");

    let err = ResourceReconciler::new(&apis)
        .reconcile(&api_spec(Some("v1"), Directive::Present), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteAccess);
    assert_eq!(
        err.to_string(),
        "Encountered fatal error calling lookup for rest api 'docs.example.io': service error (429): Too Many Requests"
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_domain_name_lookup_is_direct_get() {
    let gateway = MockGateway::spawn().await;
    let domains = gateway.backend(25).domain_names();

    assert_eq!(domains.find("api.example.io").await.unwrap(), None);
    let request = &gateway.requests()[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "domainnames/api.example.io");

    gateway.seed(
        "domainnames",
        vec![json!({"domainName": "api.example.io", "certificateName": "old-cert"})],
    );
    let desired = DomainNameSpec {
        name: "api.example.io".to_string(),
        cert_name: Some("new-cert".to_string()),
        cert_body: Some("body".to_string()),
        cert_private_key: Some("key".to_string()),
        cert_chain: Some("chain".to_string()),
        state: Directive::Present,
    };
    let result = ResourceReconciler::new(&domains)
        .reconcile(&desired, false)
        .await
        .unwrap();
    assert!(result.changed);
    assert_eq!(
        result.resource.unwrap().certificate_name.as_deref(),
        Some("new-cert")
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_delete_of_unknown_id_is_not_found() {
    let gateway = MockGateway::spawn().await;
    let apis = gateway.backend(25).rest_apis();

    let err = apis.delete("missing").await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_path_resources_created_under_parents() {
    let gateway = MockGateway::spawn().await;
    let collection = "restapis/c8888abcde/resources";
    gateway.seed(collection, vec![json!({"id": "root000000", "path": "/"})]);
    let resources = gateway.backend(25).resources("c8888abcde");

    let desired = PathResourceSpec {
        rest_api_id: "c8888abcde".to_string(),
        name: "/pets/{id}".to_string(),
        state: Directive::Present,
    };
    let result = PathReconciler::new(&resources)
        .reconcile(&desired, false)
        .await
        .unwrap();
    assert!(result.changed);
    assert_eq!(result.resource.unwrap().path, "/pets/{id}");

    let paths: Vec<String> = gateway
        .items(collection)
        .iter()
        .filter_map(|r| r["path"].as_str().map(str::to_string))
        .collect();
    assert_eq!(paths, vec!["/", "/pets", "/pets/{id}"]);

    let again = PathReconciler::new(&resources)
        .reconcile(&desired, false)
        .await
        .unwrap();
    assert!(!again.changed);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_deployment_posts_stage() {
    let gateway = MockGateway::spawn().await;
    let collection = "restapis/c8888abcde/deployments";
    gateway.seed(collection, Vec::new());
    let deployments = gateway.backend(25).deployments("c8888abcde");

    let desired = DeploymentSpec {
        rest_api_id: "c8888abcde".to_string(),
        name: "prod".to_string(),
        ..Default::default()
    };
    let result = Deployer::new(&deployments)
        .deploy(&desired, false)
        .await
        .unwrap();
    assert!(result.changed);
    assert!(result.resource.is_some());
    assert_eq!(
        gateway.mutating_requests()[0].body,
        Some(json!({
            "stageName": "prod",
            "stageDescription": "",
            "description": "",
            "cacheClusterEnabled": false,
        }))
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_domain_name_without_certificate_material_is_noop() {
    let gateway = MockGateway::spawn().await;
    gateway.seed(
        "domainnames",
        vec![json!({"domainName": "api.example.io", "certificateName": "cert"})],
    );
    let domains = gateway.backend(25).domain_names();

    let desired = DomainNameSpec {
        name: "api.example.io".to_string(),
        cert_name: Some("cert".to_string()),
        state: Directive::Present,
        ..Default::default()
    };
    let result = ResourceReconciler::new(&domains)
        .reconcile(&desired, false)
        .await
        .unwrap();
    assert!(!result.changed);
    assert!(gateway.mutating_requests().is_empty());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_method_put_then_patch() {
    let gateway = MockGateway::spawn().await;
    let methods = gateway.backend(25).methods("c8888abcde", "r3s0urce01");
    let reconciler = ResourceReconciler::new(&methods);
    let desired = MethodSpec {
        rest_api_id: "c8888abcde".to_string(),
        resource_id: "r3s0urce01".to_string(),
        name: "GET".to_string(),
        request_params: vec![RequestParam {
            name: "id".to_string(),
            location: "path".parse().unwrap(),
            param_required: true,
        }],
        ..Default::default()
    };

    let created = reconciler.reconcile(&desired, false).await.unwrap();
    assert!(created.changed);
    let mutating = gateway.mutating_requests();
    assert_eq!(mutating[0].method, Method::PUT);
    assert_eq!(
        mutating[0].path,
        "restapis/c8888abcde/resources/r3s0urce01/methods/GET"
    );

    let again = reconciler.reconcile(&desired, false).await.unwrap();
    assert!(!again.changed);

    gateway.clear_requests();
    let desired = MethodSpec {
        request_models: vec![RequestModel {
            content_type: "application/json".to_string(),
            model: "Pet".to_string(),
        }],
        ..desired
    };
    let updated = reconciler.reconcile(&desired, false).await.unwrap();
    assert!(updated.changed);
    assert_eq!(
        updated.resource.unwrap().request_models["application/json"],
        "Pet"
    );

    let mutating = gateway.mutating_requests();
    assert_eq!(mutating.len(), 1);
    assert_eq!(mutating[0].method, Method::PATCH);
    assert_eq!(
        mutating[0].body,
        Some(json!({
            "patchOperations": [
                {"op": "add", "path": "/requestModels/application~1json", "value": "Pet"}
            ]
        }))
    );

    gateway.shutdown().await;
}
