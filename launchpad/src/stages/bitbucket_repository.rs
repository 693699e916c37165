//! Bitbucket repository configuration.

use crate::auth::TokenSource;
use crate::context::{BitbucketRepository, Context, Feature};
use crate::errors::Result;
use crate::interact::Interaction;
use crate::remote::bitbucket::{parse_clone_url, BitbucketClient};
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;

const DECLINED_REASON: &str = "Bitbucket repository not configured";
const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// Optionally links a Bitbucket repository: clone-URL parse, access
/// token acquisition, UUID resolution, and pipeline enablement.
pub struct BitbucketRepositoryStage {
    tokens: Arc<dyn TokenSource>,
    base_url: String,
    allow_skip: bool,
}

impl BitbucketRepositoryStage {
    /// Creates the stage against the public Bitbucket API.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
            allow_skip: true,
        }
    }

    /// Overrides the API base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Disables the use-Bitbucket toggle for generators that require a
    /// repository.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.allow_skip = false;
        self
    }
}

#[async_trait]
impl Stage for BitbucketRepositoryStage {
    fn title(&self) -> &str {
        "Configure Bitbucket repository"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        if self.allow_skip && !interact.confirm("Use Bitbucket?", true).await? {
            ctx.set_bitbucket_repository(Feature::disabled(DECLINED_REASON));
            return Ok(StageOutcome::skipped(DECLINED_REASON));
        }

        let clone_url = interact.input("Repository clone URL:", None).await?;
        let coords = parse_clone_url(&clone_url)?;

        let access_token = self.tokens.access_token().await?;
        let client = BitbucketClient::with_base_url(
            &self.base_url,
            &access_token,
            &coords.workspace,
            &coords.repository,
        );

        let repository_uuid = client.repository_uuid().await?;
        client.enable_pipeline().await?;

        ctx.set_bitbucket_repository(Feature::Enabled(BitbucketRepository {
            access_token,
            workspace: coords.workspace,
            repository: coords.repository,
            repository_uuid,
        }));
        Ok(StageOutcome::Completed)
    }
}
