//! apigw-reconcile: declarative state sync for API gateway resources.
//!
//! Each managed resource kind (REST API, custom domain name, path resource,
//! method, deployment) is described by a typed desired state. A reconciler looks the
//! resource up through a [`RemoteAccessor`], compares it with the desired
//! state and issues at most the mutating calls needed to converge:
//!
//! ```text
//! START -> LOOKUP -> { CREATE | UPDATE | DELETE | NOOP } -> DONE
//! ```
//!
//! # Example
//! ```ignore
//! use apigw_reconcile::clients::MemoryCollection;
//! use apigw_reconcile::resources::{RestApi, RestApiSpec};
//! use apigw_reconcile::{Directive, ResourceReconciler};
//!
//! let apis = MemoryCollection::<RestApi>::new();
//! let spec = RestApiSpec {
//!     name: "docs.example.io".to_string(),
//!     description: Some("v1".to_string()),
//!     state: Directive::Present,
//! };
//! let result = ResourceReconciler::new(&apis).reconcile(&spec, false).await?;
//! assert!(result.changed);
//! ```

pub mod accessor;
pub mod clients;
pub mod config;
pub mod error;
pub mod patch;
pub mod reconciler;
pub mod resources;
pub mod state;

pub use accessor::{DesiredState, RemoteAccessor, RemoteResource};
pub use config::{BackendConfig, BackendKind, Declaration};
pub use error::{ErrorKind, Operation, ReconcileError, RemoteError, Result};
pub use patch::{PatchOp, PatchOpKind};
pub use reconciler::{Deployer, PathReconciler, ResourceReconciler};
pub use state::{Action, Directive, ReconciliationResult};
