//! Reconcilers.
//!
//! Each reconciler compares a declared state with what the remote collection
//! holds and issues at most the calls needed to converge. A pass is a single
//! lookup followed by one terminal branch; nothing is retried here.

pub mod deployment;
pub mod path;

pub use deployment::Deployer;
pub use path::PathReconciler;

use tracing::{debug, info, warn};

use crate::accessor::{DesiredState, RemoteAccessor, RemoteResource};
use crate::error::{Operation, ReconcileError, Result};
use crate::state::{Action, Directive, ReconciliationResult};

/// Generic reconciler for kinds whose lifecycle is create/update/delete by key.
pub struct ResourceReconciler<'a, A> {
    accessor: &'a A,
}

impl<'a, A: RemoteAccessor> ResourceReconciler<'a, A> {
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    /// Fetches the remote record matching `key`.
    pub async fn lookup(&self, key: &str) -> Result<Option<A::Resource>> {
        self.accessor
            .find(key)
            .await
            .map_err(|e| ReconcileError::remote(Operation::Lookup, A::Resource::KIND, key, e))
    }

    /// Whether any tracked attribute of `remote` differs from `desired`.
    pub fn diff<D>(remote: &A::Resource, desired: &D) -> bool
    where
        D: DesiredState<Resource = A::Resource>,
    {
        !desired.patches(remote).is_empty()
    }

    pub async fn reconcile<D>(
        &self,
        desired: &D,
        simulate: bool,
    ) -> Result<ReconciliationResult<A::Resource>>
    where
        D: DesiredState<Resource = A::Resource>,
    {
        desired.validate()?;

        let kind = A::Resource::KIND;
        let key = desired.key();
        info!("Reconciling {} '{}' ({})", kind, key, desired.directive());

        let remote = self.lookup(key).await?;

        match (desired.directive(), remote) {
            (Directive::Absent, None) => {
                debug!("{} '{}' already absent", kind, key);
                Ok(ReconciliationResult::unchanged(None))
            }
            (Directive::Absent, Some(remote)) => {
                if simulate {
                    info!("Would delete {} '{}' ({})", kind, key, remote.id());
                    return Ok(ReconciliationResult::changed(Action::Delete, Some(remote)));
                }
                match self.accessor.delete(remote.id()).await {
                    Ok(()) => {
                        info!("Deleted {} '{}' ({})", kind, key, remote.id());
                        Ok(ReconciliationResult::changed(Action::Delete, Some(remote)))
                    }
                    Err(e) if e.is_not_found() => {
                        warn!("{} '{}' disappeared before delete: {}", kind, key, e);
                        Ok(ReconciliationResult::unchanged(None))
                    }
                    Err(e) => Err(ReconcileError::remote(Operation::Delete, kind, key, e)),
                }
            }
            (Directive::Present, None) => {
                let request = desired.create_request();
                if simulate {
                    info!("Would create {} '{}'", kind, key);
                    return Ok(ReconciliationResult::changed(Action::Create, None));
                }
                let created = self
                    .accessor
                    .create(&request)
                    .await
                    .map_err(|e| ReconcileError::remote(Operation::Create, kind, key, e))?;
                info!("Created {} '{}' ({})", kind, key, created.id());
                Ok(ReconciliationResult::changed(Action::Create, Some(created)))
            }
            (Directive::Present, Some(remote)) => {
                let patches = desired.patches(&remote);
                if patches.is_empty() {
                    debug!("{} '{}' is up to date", kind, key);
                    return Ok(ReconciliationResult::unchanged(Some(remote)));
                }
                if simulate {
                    info!(
                        "Would update {} '{}' ({} patches)",
                        kind,
                        key,
                        patches.len()
                    );
                    return Ok(ReconciliationResult::changed(Action::Update, Some(remote)));
                }
                let updated = self
                    .accessor
                    .update(remote.id(), &patches)
                    .await
                    .map_err(|e| ReconcileError::remote(Operation::Update, kind, key, e))?;
                info!(
                    "Updated {} '{}' ({}, {} patches)",
                    kind,
                    key,
                    updated.id(),
                    patches.len()
                );
                Ok(ReconciliationResult::changed(Action::Update, Some(updated)))
            }
        }
    }
}
