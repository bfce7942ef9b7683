//! Managed resource kinds: desired state, remote record and create request
//! for each.

pub mod deployment;
pub mod domain_name;
pub mod method;
pub mod path_resource;
pub mod rest_api;

pub use deployment::{CacheClusterSize, CreateDeploymentRequest, Deployment, DeploymentSpec};
pub use domain_name::{CreateDomainNameRequest, DomainName, DomainNameSpec};
pub use method::{CreateMethodRequest, Method, MethodSpec, ParamLocation, RequestModel, RequestParam};
pub use path_resource::{CreatePathResourceRequest, PathResource, PathResourceSpec};
pub use rest_api::{CreateRestApiRequest, RestApi, RestApiSpec};
