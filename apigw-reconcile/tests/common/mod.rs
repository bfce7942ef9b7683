//! Shared test utilities for apigw-reconcile integration tests.
//!
//! `MockGateway` serves any number of JSON collections over HTTP the way the
//! gateway control plane does: paginated listing, direct get, create,
//! patch and delete.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use apigw_reconcile::PatchOp;
use apigw_reconcile::patch;
use apigw_reconcile::clients::HttpBackend;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A request as received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Gateway {
    collections: BTreeMap<String, Vec<Value>>,
    requests: Vec<Request>,
    fail_next: Option<(StatusCode, String)>,
    next_id: u64,
}

type Shared = Arc<Mutex<Gateway>>;

/// Field identifying an item of `collection`.
fn key_field(collection: &str) -> &'static str {
    if collection == "domainnames" {
        "domainName"
    } else if collection.ends_with("/methods") {
        "httpMethod"
    } else {
        "id"
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "message": message.into() }))).into_response()
}

fn ok(value: Value) -> Response {
    (StatusCode::OK, axum::Json(value)).into_response()
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
        }
    };

    let mut gateway = state.lock().unwrap();
    gateway.requests.push(Request {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        body: body.clone(),
    });
    if let Some((status, message)) = gateway.fail_next.take() {
        return error(status, message);
    }

    let path = path.trim_matches('/').to_string();
    if gateway.collections.contains_key(&path) {
        return match method {
            Method::GET => list(&gateway, &path, &query),
            Method::POST => create(&mut gateway, &path, body),
            _ => error(StatusCode::METHOD_NOT_ALLOWED, "unsupported on collection"),
        };
    }

    let Some((collection, id)) = path.rsplit_once('/') else {
        return error(StatusCode::NOT_FOUND, format!("no collection '{}'", path));
    };
    let field = key_field(collection);
    if method == Method::PUT {
        return put(&mut gateway, collection, field, id, body);
    }
    let Some(items) = gateway.collections.get_mut(collection) else {
        return error(StatusCode::NOT_FOUND, format!("no collection '{}'", collection));
    };
    let Some(index) = items.iter().position(|item| item[field] == id) else {
        return error(StatusCode::NOT_FOUND, format!("Invalid identifier specified: {}", id));
    };

    match method {
        Method::GET => ok(items[index].clone()),
        Method::DELETE => {
            items.remove(index);
            StatusCode::ACCEPTED.into_response()
        }
        Method::PATCH => {
            let operations: Vec<PatchOp> = match body
                .as_ref()
                .and_then(|b| b.get("patchOperations"))
                .cloned()
                .map(serde_json::from_value)
            {
                Some(Ok(operations)) => operations,
                _ => return error(StatusCode::BAD_REQUEST, "missing patchOperations"),
            };
            let mut item = items[index].clone();
            if let Err(e) = patch::apply(&mut item, &operations) {
                return error(StatusCode::BAD_REQUEST, e.to_string());
            }
            items[index] = item.clone();
            ok(item)
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "unsupported on item"),
    }
}

fn list(gateway: &Gateway, collection: &str, query: &HashMap<String, String>) -> Response {
    let items = &gateway.collections[collection];
    let limit = query
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(25);
    let start = query
        .get("position")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(0);

    let end = (start + limit).min(items.len());
    let page: Vec<Value> = items.get(start..end).unwrap_or_default().to_vec();
    if end < items.len() {
        ok(json!({ "items": page, "position": end.to_string() }))
    } else {
        ok(json!({ "items": page }))
    }
}

fn create(gateway: &mut Gateway, collection: &str, body: Option<Value>) -> Response {
    let Some(Value::Object(mut item)) = body else {
        return error(StatusCode::BAD_REQUEST, "expected a JSON object");
    };

    if key_field(collection) == "id" {
        gateway.next_id += 1;
        item.insert("id".to_string(), json!(format!("id{:08}", gateway.next_id)));
    }

    // Path resources carry their full path
    if let (Some(parent_id), Some(part)) = (
        item.get("parentId").and_then(Value::as_str),
        item.get("pathPart").and_then(Value::as_str),
    ) {
        let items = &gateway.collections[collection];
        let Some(parent) = items.iter().find(|r| r["id"] == parent_id) else {
            return error(StatusCode::NOT_FOUND, format!("Invalid Resource identifier specified: {}", parent_id));
        };
        let parent_path = parent["path"].as_str().unwrap_or("/");
        let path = if parent_path == "/" {
            format!("/{}", part)
        } else {
            format!("{}/{}", parent_path, part)
        };
        item.insert("path".to_string(), json!(path));
    }

    let item = Value::Object(item);
    if let Some(items) = gateway.collections.get_mut(collection) {
        items.push(item.clone());
    }
    (StatusCode::CREATED, axum::Json(item)).into_response()
}

/// Creates or replaces the item keyed `key`, creating the collection if needed.
fn put(
    gateway: &mut Gateway,
    collection: &str,
    field: &str,
    key: &str,
    body: Option<Value>,
) -> Response {
    let Some(Value::Object(mut item)) = body else {
        return error(StatusCode::BAD_REQUEST, "expected a JSON object");
    };
    item.insert(field.to_string(), json!(key));
    let item = Value::Object(item);

    let items = gateway.collections.entry(collection.to_string()).or_default();
    match items.iter().position(|existing| existing[field] == key) {
        Some(index) => items[index] = item.clone(),
        None => items.push(item.clone()),
    }
    (StatusCode::CREATED, axum::Json(item)).into_response()
}

/// Mock gateway bound to an ephemeral local port.
pub struct MockGateway {
    pub addr: SocketAddr,
    state: Shared,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl MockGateway {
    /// Spawn a gateway with empty `restapis` and `domainnames` collections.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(Gateway::default()));
        {
            let mut gateway = state.lock().unwrap();
            gateway.collections.insert("restapis".to_string(), Vec::new());
            gateway.collections.insert("domainnames".to_string(), Vec::new());
        }

        let router = Router::new()
            .route("/{*path}", any(handle))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// HTTP backend pointed at this gateway.
    pub fn backend(&self, page_size: u32) -> HttpBackend {
        HttpBackend::new(&self.base_url(), Duration::from_secs(5), page_size)
            .expect("Failed to build client")
    }

    /// Adds `items` to `collection`, creating it if needed.
    pub fn seed(&self, collection: &str, items: Vec<Value>) {
        let mut gateway = self.state.lock().unwrap();
        gateway
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(items);
    }

    pub fn items(&self, collection: &str) -> Vec<Value> {
        let gateway = self.state.lock().unwrap();
        gateway
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests other than GET.
    pub fn mutating_requests(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::GET)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    /// Makes the next request fail with `status`.
    pub fn fail_next(&self, status: StatusCode, message: &str) {
        self.state.lock().unwrap().fail_next = Some((status, message.to_string()));
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}
