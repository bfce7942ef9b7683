//! Path resource reconciler.
//!
//! Unlike the generic kinds, a path may need several creates: every missing
//! part of the path is created under its parent, root first.

use tracing::{debug, info, warn};

use crate::accessor::{RemoteAccessor, RemoteResource};
use crate::error::{Operation, ReconcileError, RemoteError, Result};
use crate::resources::path_resource::{PathMap, path_map, plan_creation};
use crate::resources::{CreatePathResourceRequest, PathResource, PathResourceSpec};
use crate::state::{Action, Directive, ReconciliationResult};

pub struct PathReconciler<'a, A> {
    accessor: &'a A,
}

impl<'a, A> PathReconciler<'a, A>
where
    A: RemoteAccessor<Resource = PathResource>,
{
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    async fn existing(&self, path: &str) -> Result<PathMap> {
        let resources = self
            .accessor
            .list()
            .await
            .map_err(|e| ReconcileError::remote(Operation::Lookup, PathResource::KIND, path, e))?;
        Ok(path_map(resources))
    }

    pub async fn reconcile(
        &self,
        desired: &PathResourceSpec,
        simulate: bool,
    ) -> Result<ReconciliationResult<PathResource>> {
        desired.validate()?;

        let path = desired.name.as_str();
        info!(
            "Reconciling resource '{}' of api {} ({})",
            path, desired.rest_api_id, desired.state
        );

        let mut existing = self.existing(path).await?;
        if !existing.contains_key("/") {
            return Err(ReconcileError::remote(
                Operation::Lookup,
                PathResource::KIND,
                path,
                RemoteError::NotFound(format!("root resource of api {}", desired.rest_api_id)),
            ));
        }

        match desired.state {
            Directive::Absent => self.remove(&existing, path, simulate).await,
            Directive::Present => {
                if let Some(resource) = existing.get(path) {
                    debug!("Resource '{}' already exists ({})", path, resource.id);
                    return Ok(ReconciliationResult::unchanged(Some(resource.clone())));
                }

                let plan = plan_creation(&existing, path);
                if simulate {
                    info!("Would create {} path parts for '{}'", plan.len(), path);
                    return Ok(ReconciliationResult::changed(Action::Create, None));
                }

                let mut last = None;
                for step in plan {
                    let parent_id = existing
                        .get(&step.parent)
                        .map(|parent| parent.id.clone())
                        .ok_or_else(|| {
                            ReconcileError::remote(
                                Operation::Create,
                                PathResource::KIND,
                                step.path.as_str(),
                                RemoteError::NotFound(format!("parent '{}'", step.parent)),
                            )
                        })?;
                    let request = CreatePathResourceRequest {
                        parent_id,
                        path_part: step.part.clone(),
                    };
                    let created = self.accessor.create(&request).await.map_err(|e| {
                        ReconcileError::remote(
                            Operation::Create,
                            PathResource::KIND,
                            step.path.as_str(),
                            e,
                        )
                    })?;
                    info!("Created resource '{}' ({})", step.path, created.id);
                    existing.insert(step.path, created.clone());
                    last = Some(created);
                }

                Ok(ReconciliationResult::changed(Action::Create, last))
            }
        }
    }

    async fn remove(
        &self,
        existing: &PathMap,
        path: &str,
        simulate: bool,
    ) -> Result<ReconciliationResult<PathResource>> {
        let Some(resource) = existing.get(path) else {
            debug!("Resource '{}' already absent", path);
            return Ok(ReconciliationResult::unchanged(None));
        };

        if simulate {
            info!("Would delete resource '{}' ({})", path, resource.id);
            return Ok(ReconciliationResult::changed(Action::Delete, None));
        }

        match self.accessor.delete(&resource.id).await {
            Ok(()) => {
                info!("Deleted resource '{}' ({})", path, resource.id);
                Ok(ReconciliationResult::changed(Action::Delete, None))
            }
            Err(e) if e.is_not_found() => {
                warn!("Resource '{}' disappeared before delete: {}", path, e);
                Ok(ReconciliationResult::unchanged(None))
            }
            Err(e) => Err(ReconcileError::remote(
                Operation::Delete,
                PathResource::KIND,
                path,
                e,
            )),
        }
    }
}
