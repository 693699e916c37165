//! AWS environment configuration.

use crate::cloud::CloudProvider;
use crate::context::{AwsEnv, Context, Feature};
use crate::errors::Result;
use crate::interact::Interaction;
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;

const DECLINED_REASON: &str = "AWS environment not configured";
const DEFAULT_REGION: &str = "us-east-1";

/// Optionally configures an AWS environment: identity check, region
/// prompt, and one-time bootstrap.
pub struct AwsEnvStage {
    provider: Arc<dyn CloudProvider>,
    allow_skip: bool,
}

impl AwsEnvStage {
    /// Creates the stage with the use-AWS toggle enabled.
    #[must_use]
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self {
            provider,
            allow_skip: true,
        }
    }

    /// Creates the stage for generators that require AWS; the toggle is
    /// not offered.
    #[must_use]
    pub fn required(provider: Arc<dyn CloudProvider>) -> Self {
        Self {
            provider,
            allow_skip: false,
        }
    }
}

#[async_trait]
impl Stage for AwsEnvStage {
    fn title(&self) -> &str {
        "Configure AWS environment"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        if self.allow_skip && !interact.confirm("Use AWS environment?", true).await? {
            ctx.set_aws_env(Feature::disabled(DECLINED_REASON));
            return Ok(StageOutcome::skipped(DECLINED_REASON));
        }

        let account_id = self.provider.caller_account(interact).await?;
        let region = interact
            .input("AWS region:", Some(DEFAULT_REGION))
            .await?;

        self.provider
            .bootstrap(interact, &account_id, &region)
            .await?;

        ctx.set_aws_env(Feature::Enabled(AwsEnv { account_id, region }));
        Ok(StageOutcome::Completed)
    }
}
