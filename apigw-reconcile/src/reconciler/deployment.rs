//! Deployments are not reconciled against existing state: every pass
//! creates a new deployment of the API to the requested stage.

use tracing::info;

use crate::accessor::{RemoteAccessor, RemoteResource};
use crate::error::{Operation, ReconcileError, Result};
use crate::resources::{Deployment, DeploymentSpec};
use crate::state::{Action, ReconciliationResult};

pub struct Deployer<'a, A> {
    accessor: &'a A,
}

impl<'a, A> Deployer<'a, A>
where
    A: RemoteAccessor<Resource = Deployment>,
{
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    pub async fn deploy(
        &self,
        desired: &DeploymentSpec,
        simulate: bool,
    ) -> Result<ReconciliationResult<Deployment>> {
        desired.validate()?;
        info!(
            "Deploying api {} to stage '{}'",
            desired.rest_api_id, desired.name
        );

        let request = desired.create_request();
        if simulate {
            info!("Would create deployment of api {}", desired.rest_api_id);
            return Ok(ReconciliationResult::changed(Action::Create, None));
        }

        let deployment = self.accessor.create(&request).await.map_err(|e| {
            ReconcileError::remote(
                Operation::Create,
                Deployment::KIND,
                desired.name.as_str(),
                e,
            )
        })?;
        info!(
            "Created deployment {} of api {} on stage '{}'",
            deployment.id, desired.rest_api_id, desired.name
        );
        Ok(ReconciliationResult::changed(Action::Create, Some(deployment)))
    }
}
