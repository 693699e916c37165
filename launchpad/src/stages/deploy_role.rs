//! Deployment trust role provisioning.
//!
//! Depends on both the AWS environment and the Bitbucket repository. A
//! disabled prerequisite cascades: this stage records its own output as
//! disabled and skips without touching any collaborator. Each stage
//! checks its own direct dependencies; there is no global
//! short-circuit.

use crate::cloud::{require_output, CloudProvider, TrustStack};
use crate::context::{Context, DeployRole, Feature};
use crate::errors::Result;
use crate::interact::Interaction;
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;

const STACK_NAME: &str = "bitbucket-openid-connect";
const ROLE_ARN_OUTPUT: &str = "RoleArn";

/// Provisions a trust role binding the repository identity to a cloud
/// role scoped to the project.
pub struct DeployRoleStage {
    provider: Arc<dyn CloudProvider>,
}

impl DeployRoleStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage for DeployRoleStage {
    fn title(&self) -> &str {
        "Setup deployment role"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        let aws = match ctx.require_aws_env()?.clone() {
            Feature::Enabled(aws) => aws,
            Feature::Disabled(_) => {
                let reason = "AWS environment disabled";
                ctx.set_deploy_role(Feature::disabled(reason));
                return Ok(StageOutcome::skipped(reason));
            }
        };

        let repository = match ctx.require_bitbucket_repository()?.clone() {
            Feature::Enabled(repository) => repository,
            Feature::Disabled(_) => {
                let reason = "Bitbucket repository disabled";
                ctx.set_deploy_role(Feature::disabled(reason));
                return Ok(StageOutcome::skipped(reason));
            }
        };

        let project = ctx.require_project()?.clone();

        // The role may live in a different trust boundary than the
        // application environment, so the region is asked again.
        let region = interact
            .input("Deployment role region:", Some(&aws.region))
            .await?;
        if region != aws.region {
            self.provider
                .bootstrap(interact, &aws.account_id, &region)
                .await?;
        }

        let stack = TrustStack {
            stack_name: STACK_NAME.to_string(),
            project: project.name,
            repository_uuid: repository.repository_uuid,
            region,
        };
        let outputs = self.provider.deploy_trust_stack(interact, &stack).await?;
        let arn = require_output(&outputs, STACK_NAME, ROLE_ARN_OUTPUT)?.to_string();

        ctx.set_deploy_role(Feature::Enabled(DeployRole { arn }));
        Ok(StageOutcome::Completed)
    }
}
