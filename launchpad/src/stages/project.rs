//! Project directory creation.

use crate::context::{Context, Project};
use crate::errors::{LaunchpadError, Result};
use crate::interact::Interaction;
use crate::process::{CommandRunner, CommandSpec};
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Prompts for a project name, creates the directory, and runs
/// `git init` in it.
pub struct ProjectStage {
    runner: Arc<dyn CommandRunner>,
    parent_dir: Option<PathBuf>,
}

impl ProjectStage {
    /// Creates the stage; the project lands in the current directory.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            parent_dir: None,
        }
    }

    /// Overrides the parent directory (used by tests).
    #[must_use]
    pub fn in_dir(mut self, parent: impl Into<PathBuf>) -> Self {
        self.parent_dir = Some(parent.into());
        self
    }
}

#[async_trait]
impl Stage for ProjectStage {
    fn title(&self) -> &str {
        "Configure project directory"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        let name = interact
            .input("Name:", ctx.input_name.as_deref())
            .await?;

        let parent = match &self.parent_dir {
            Some(parent) => parent.clone(),
            None => std::env::current_dir()?,
        };
        let path = parent.join(&name);

        if tokio::fs::metadata(&path).await.is_ok() {
            return Err(LaunchpadError::validation(format!(
                "path {} already exists",
                path.display()
            )));
        }

        tokio::fs::create_dir(&path).await?;
        self.runner
            .run(interact, CommandSpec::new("git", &["init"]).cwd(&path))
            .await?;

        ctx.set_project(Project { name, path });
        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingRunner, ScriptedInteraction};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn creates_directory_and_initializes_git() {
        let parent = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let stage = ProjectStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>).in_dir(parent.path());
        let interact = ScriptedInteraction::new();
        interact.push_input("widgets");
        let mut ctx = Context::default();

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::Completed);

        let project = ctx.require_project().unwrap();
        assert_eq!(project.name, "widgets");
        assert!(project.path.is_dir());
        assert_eq!(runner.calls(), vec!["git init".to_string()]);
    }

    #[tokio::test]
    async fn cli_name_is_offered_as_default() {
        let parent = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let stage = ProjectStage::new(runner).in_dir(parent.path());
        let interact = ScriptedInteraction::new();
        let mut ctx = Context::new(Some("from-cli".to_string()));

        stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(ctx.require_project().unwrap().name, "from-cli");
    }

    #[tokio::test]
    async fn existing_path_fails_validation() {
        let parent = tempfile::tempdir().unwrap();
        std::fs::create_dir(parent.path().join("widgets")).unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let stage = ProjectStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>).in_dir(parent.path());
        let interact = ScriptedInteraction::new();
        interact.push_input("widgets");
        let mut ctx = Context::default();

        let err = stage.run(&mut ctx, &interact).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(ctx.require_project().is_err());
        assert!(runner.calls().is_empty());
    }
}
