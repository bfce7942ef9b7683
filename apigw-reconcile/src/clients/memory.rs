//! In-memory remote collections.
//!
//! Used by the test suites and by the `memory` backend for dry runs against
//! an empty gateway. Every call is journaled so callers can assert exactly
//! which remote operations a reconciliation issued, and faults can be
//! injected per operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::accessor::{RemoteAccessor, RemoteResource, first_match};
use crate::error::{Operation, RemoteError};
use crate::patch::{self, PatchOp};
use crate::resources::path_resource::join_path;
use crate::resources::{
    CreateDeploymentRequest, CreateDomainNameRequest, CreateMethodRequest,
    CreatePathResourceRequest, CreateRestApiRequest, Deployment, DomainName, Method, PathResource,
    RestApi,
};

/// Records an in-memory collection can create without a remote service.
pub trait MemoryRecord: RemoteResource {
    /// The record a collection holds after accepting `request` under `id`.
    /// `existing` is the collection content before the create.
    fn materialize(id: String, request: &Self::Create, existing: &[Self]) -> Self;
}

fn now() -> Option<String> {
    Some(chrono::Utc::now().to_rfc3339())
}

impl MemoryRecord for RestApi {
    fn materialize(id: String, request: &CreateRestApiRequest, _existing: &[Self]) -> Self {
        RestApi {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            created_date: now(),
        }
    }
}

impl MemoryRecord for DomainName {
    fn materialize(_id: String, request: &CreateDomainNameRequest, _existing: &[Self]) -> Self {
        DomainName {
            domain_name: request.domain_name.clone(),
            certificate_name: request.certificate_name.clone(),
            certificate_upload_date: now(),
            distribution_domain_name: None,
        }
    }
}

impl MemoryRecord for PathResource {
    fn materialize(id: String, request: &CreatePathResourceRequest, existing: &[Self]) -> Self {
        let parent_path = existing
            .iter()
            .find(|r| r.id == request.parent_id)
            .map(|r| r.path.as_str())
            .unwrap_or("/");
        PathResource {
            id,
            path: join_path(parent_path, &request.path_part),
            parent_id: Some(request.parent_id.clone()),
            path_part: Some(request.path_part.clone()),
        }
    }
}

impl MemoryRecord for Method {
    fn materialize(_id: String, request: &CreateMethodRequest, _existing: &[Self]) -> Self {
        Method {
            http_method: request.http_method.clone(),
            authorization_type: Some(request.authorization_type.clone()),
            authorizer_id: request.authorizer_id.clone(),
            api_key_required: Some(request.api_key_required),
            request_parameters: request.request_parameters.clone(),
            request_models: request.request_models.clone(),
        }
    }
}

impl MemoryRecord for Deployment {
    fn materialize(id: String, request: &CreateDeploymentRequest, _existing: &[Self]) -> Self {
        Deployment {
            id,
            description: Some(request.description.clone()).filter(|d| !d.is_empty()),
            created_date: now(),
        }
    }
}

/// A remote call as seen by a [`MemoryCollection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Find(String),
    Create(Value),
    Update { id: String, patches: Vec<PatchOp> },
    Delete(String),
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Call::Create(_) | Call::Update { .. } | Call::Delete(_)
        )
    }
}

struct Inner<R> {
    items: Vec<R>,
    calls: Vec<Call>,
    faults: HashMap<Operation, RemoteError>,
}

/// Thread-safe in-memory collection of one resource kind.
pub struct MemoryCollection<R> {
    inner: Mutex<Inner<R>>,
}

impl<R: RemoteResource> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RemoteResource> MemoryCollection<R> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Collection pre-populated with `items`, in listing order.
    pub fn with_items(items: Vec<R>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items,
                calls: Vec::new(),
                faults: HashMap::new(),
            }),
        }
    }

    /// Appends a record without journaling a call.
    pub async fn insert(&self, item: R) {
        self.inner.lock().await.items.push(item);
    }

    pub async fn items(&self) -> Vec<R> {
        self.inner.lock().await.items.clone()
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn mutating_calls(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(Call::is_mutating)
            .collect()
    }

    /// Makes every later call of `operation` fail with `error`.
    pub async fn fail_on(&self, operation: Operation, error: RemoteError) {
        self.inner.lock().await.faults.insert(operation, error);
    }

    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }
}

impl<R> Inner<R> {
    fn record(&mut self, call: Call, operation: Operation) -> Result<(), RemoteError> {
        self.calls.push(call);
        match self.faults.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

#[async_trait]
impl<R: MemoryRecord> RemoteAccessor for MemoryCollection<R> {
    type Resource = R;

    async fn list(&self) -> Result<Vec<R>, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.record(Call::List, Operation::Lookup)?;
        Ok(inner.items.clone())
    }

    async fn find(&self, key: &str) -> Result<Option<R>, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.record(Call::Find(key.to_string()), Operation::Lookup)?;
        Ok(first_match(inner.items.clone(), key))
    }

    async fn create(&self, request: &R::Create) -> Result<R, RemoteError> {
        let body =
            serde_json::to_value(request).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let mut inner = self.inner.lock().await;
        inner.record(Call::Create(body), Operation::Create)?;

        let item = R::materialize(new_id(), request, &inner.items);
        debug!("Created {} {} in memory", R::KIND, item.id());
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, patches: &[PatchOp]) -> Result<R, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.record(
            Call::Update {
                id: id.to_string(),
                patches: patches.to_vec(),
            },
            Operation::Update,
        )?;

        let index = inner
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| RemoteError::NotFound(format!("{} '{}'", R::KIND, id)))?;

        let mut doc = serde_json::to_value(&inner.items[index])
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        patch::apply(&mut doc, patches)?;
        let updated: R =
            serde_json::from_value(doc).map_err(|e| RemoteError::Decode(e.to_string()))?;

        debug!("Updated {} {} in memory ({} patches)", R::KIND, id, patches.len());
        inner.items[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.record(Call::Delete(id.to_string()), Operation::Delete)?;

        let before = inner.items.len();
        inner.items.retain(|item| item.id() != id);
        if inner.items.len() == before {
            return Err(RemoteError::NotFound(format!("{} '{}'", R::KIND, id)));
        }
        debug!("Deleted {} {} from memory", R::KIND, id);
        Ok(())
    }
}

/// In-memory stand-in for a whole gateway: top-level collections plus
/// per-API resources and deployments and per-resource methods.
#[derive(Default)]
pub struct MemoryGateway {
    pub rest_apis: MemoryCollection<RestApi>,
    pub domain_names: MemoryCollection<DomainName>,
    resources: Mutex<HashMap<String, Arc<MemoryCollection<PathResource>>>>,
    methods: Mutex<HashMap<(String, String), Arc<MemoryCollection<Method>>>>,
    deployments: Mutex<HashMap<String, Arc<MemoryCollection<Deployment>>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path resources of one API. A fresh API starts with its root `/`.
    pub async fn resources(&self, rest_api_id: &str) -> Arc<MemoryCollection<PathResource>> {
        let mut resources = self.resources.lock().await;
        resources
            .entry(rest_api_id.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryCollection::with_items(vec![PathResource {
                    id: new_id(),
                    path: "/".to_string(),
                    parent_id: None,
                    path_part: None,
                }]))
            })
            .clone()
    }

    /// Methods of one path resource.
    pub async fn methods(
        &self,
        rest_api_id: &str,
        resource_id: &str,
    ) -> Arc<MemoryCollection<Method>> {
        let mut methods = self.methods.lock().await;
        methods
            .entry((rest_api_id.to_string(), resource_id.to_string()))
            .or_default()
            .clone()
    }

    pub async fn deployments(&self, rest_api_id: &str) -> Arc<MemoryCollection<Deployment>> {
        let mut deployments = self.deployments.lock().await;
        deployments
            .entry(rest_api_id.to_string())
            .or_default()
            .clone()
    }
}
