//! Pipeline variable synchronization.
//!
//! Writes the provisioned environment back into the repository's build
//! pipeline as variables, using the create-or-update synchronizer. The
//! ensures run as one batch sharing a single memoized listing.

use crate::context::{Context, Feature};
use crate::errors::Result;
use crate::interact::Interaction;
use crate::remote::bitbucket::BitbucketClient;
use crate::remote::sync::VariableSync;
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// Ensures repository pipeline variables reflect the provisioned
/// environment.
pub struct VariablesStage {
    base_url: String,
}

impl VariablesStage {
    /// Creates the stage against the public Bitbucket API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the API base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for VariablesStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for VariablesStage {
    fn title(&self) -> &str {
        "Sync pipeline variables"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        _interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        let repository = match ctx.require_bitbucket_repository()?.clone() {
            Feature::Enabled(repository) => repository,
            Feature::Disabled(_) => {
                return Ok(StageOutcome::skipped("Bitbucket repository disabled"));
            }
        };
        let aws = match ctx.require_aws_env()?.clone() {
            Feature::Enabled(aws) => aws,
            Feature::Disabled(_) => {
                return Ok(StageOutcome::skipped("AWS environment disabled"));
            }
        };
        let role = ctx.require_deploy_role()?.clone();

        let client = BitbucketClient::with_base_url(
            &self.base_url,
            &repository.access_token,
            &repository.workspace,
            &repository.repository,
        );
        let sync = VariableSync::new(client.repository_variables());

        let mut ensures = vec![sync.ensure("AWS_REGION", &aws.region, false)];
        if let Feature::Enabled(role) = &role {
            ensures.push(sync.ensure("CDK_DEPLOY_ROLE_ARN", &role.arn, false));
        }
        futures::future::try_join_all(ensures).await?;

        Ok(StageOutcome::Completed)
    }
}
