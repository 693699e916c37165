//! Toolchain version check.

use crate::context::Context;
use crate::errors::{LaunchpadError, Result};
use crate::interact::Interaction;
use crate::process::{CommandRunner, CommandSpec};
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;
use semver::Version;
use std::sync::Arc;

/// Verifies that pnpm is installed and recent enough.
pub struct ToolchainStage {
    runner: Arc<dyn CommandRunner>,
    min_version: Version,
}

impl ToolchainStage {
    /// Creates the stage with a minimum pnpm version.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, min_version: Version) -> Self {
        Self {
            runner,
            min_version,
        }
    }
}

#[async_trait]
impl Stage for ToolchainStage {
    fn title(&self) -> &str {
        "Check pnpm version"
    }

    async fn run(
        &self,
        _ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        let output = self
            .runner
            .run(interact, CommandSpec::new("pnpm", &["--version"]))
            .await
            .map_err(|_| {
                LaunchpadError::validation(
                    "pnpm not found, please install the latest version: https://pnpm.io/installation",
                )
            })?;

        let raw = output.stdout.trim();
        let version = Version::parse(raw).map_err(|_| {
            LaunchpadError::validation(format!("could not parse pnpm version '{raw}'"))
        })?;

        if version < self.min_version {
            return Err(LaunchpadError::validation(format!(
                "pnpm version {version} found, need at least {}",
                self.min_version
            )));
        }

        Ok(StageOutcome::Completed)
    }
}
