//! Local git initialization against the linked repository.

use crate::context::{Context, Feature};
use crate::errors::Result;
use crate::interact::Interaction;
use crate::process::{CommandRunner, CommandSpec};
use crate::stage::{Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;

/// Wires the project directory to the Bitbucket remote and optionally
/// creates and pushes the initial commit.
pub struct GitStage {
    runner: Arc<dyn CommandRunner>,
}

impl GitStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Stage for GitStage {
    fn title(&self) -> &str {
        "Initialize Git"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        let project = ctx.require_project()?.clone();
        let repository = match ctx.require_bitbucket_repository()?.clone() {
            Feature::Enabled(repository) => repository,
            Feature::Disabled(_) => {
                return Ok(StageOutcome::skipped("Bitbucket repository disabled"));
            }
        };

        let remote = format!(
            "git@bitbucket.org:{}/{}.git",
            repository.workspace, repository.repository
        );
        self.runner
            .run(
                interact,
                CommandSpec::new("git", &["remote", "add", "origin", &remote])
                    .cwd(&project.path),
            )
            .await?;

        if !interact
            .confirm("Create and push initial commit?", true)
            .await?
        {
            return Ok(StageOutcome::skipped("initial commit not created"));
        }

        self.runner
            .run(
                interact,
                CommandSpec::new("git", &["add", "."]).cwd(&project.path),
            )
            .await?;
        self.runner
            .run(
                interact,
                CommandSpec::new("git", &["commit", "-m", "feat: initial commit"])
                    .cwd(&project.path),
            )
            .await?;

        let push = self
            .runner
            .run(
                interact,
                CommandSpec::new("git", &["push", "-u", "origin", "main"])
                    .cwd(&project.path),
            )
            .await;

        if push.is_err() {
            // One recovery attempt: offer a force push, default no.
            if !interact
                .confirm("Push failed, try force push?", false)
                .await?
            {
                return Ok(StageOutcome::skipped("push declined after failure"));
            }

            self.runner
                .run(
                    interact,
                    CommandSpec::new("git", &["push", "-fu", "origin", "main"])
                        .cwd(&project.path),
                )
                .await?;
        }

        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BitbucketRepository, Project};
    use crate::errors::LaunchpadError;
    use crate::testing::{RecordingRunner, ScriptedInteraction};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn context_with_prereqs() -> Context {
        let mut ctx = Context::default();
        ctx.set_project(Project {
            name: "widgets".to_string(),
            path: PathBuf::from("/tmp/widgets"),
        });
        ctx.set_bitbucket_repository(Feature::Enabled(BitbucketRepository {
            access_token: "token".to_string(),
            workspace: "acme".to_string(),
            repository: "widgets".to_string(),
            repository_uuid: "{repo-uuid}".to_string(),
        }));
        ctx
    }

    #[tokio::test]
    async fn happy_path_adds_remote_commits_and_pushes() {
        let runner = Arc::new(RecordingRunner::new());
        let stage = GitStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        let interact = ScriptedInteraction::new();
        interact.push_confirm(true);
        let mut ctx = context_with_prereqs();

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::Completed);
        assert_eq!(
            runner.calls(),
            vec![
                "git remote add origin git@bitbucket.org:acme/widgets.git".to_string(),
                "git add .".to_string(),
                "git commit -m feat: initial commit".to_string(),
                "git push -u origin main".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn disabled_bitbucket_skips_before_any_command() {
        let runner = Arc::new(RecordingRunner::new());
        let stage = GitStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        let interact = ScriptedInteraction::new();
        let mut ctx = context_with_prereqs();
        ctx.set_bitbucket_repository(Feature::disabled("declined"));

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(
            outcome,
            StageOutcome::skipped("Bitbucket repository disabled")
        );
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn declining_the_commit_skips_with_remote_configured() {
        let runner = Arc::new(RecordingRunner::new());
        let stage = GitStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        let interact = ScriptedInteraction::new();
        interact.push_confirm(false);
        let mut ctx = context_with_prereqs();

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::skipped("initial commit not created"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn push_failure_recovered_by_confirmed_force_push() {
        let runner = Arc::new(RecordingRunner::new());
        runner.fail_once_matching("push -u origin main");
        let stage = GitStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        let interact = ScriptedInteraction::new();
        interact.push_confirm(true); // create and push
        interact.push_confirm(true); // force push
        let mut ctx = context_with_prereqs();

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::Completed);
        let calls = runner.calls();
        assert_eq!(calls.last().unwrap(), "git push -fu origin main");
    }

    #[tokio::test]
    async fn push_failure_with_declined_force_push_is_a_skip() {
        let runner = Arc::new(RecordingRunner::new());
        runner.fail_once_matching("push -u origin main");
        let stage = GitStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        let interact = ScriptedInteraction::new();
        interact.push_confirm(true); // create and push
        interact.push_confirm(false); // decline force push
        let mut ctx = context_with_prereqs();

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::skipped("push declined after failure"));
    }

    #[tokio::test]
    async fn force_push_failure_is_a_hard_failure() {
        let runner = Arc::new(RecordingRunner::new());
        runner.fail_matching("push");
        let stage = GitStage::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        let interact = ScriptedInteraction::new();
        interact.push_confirm(true); // create and push
        interact.push_confirm(true); // force push
        let mut ctx = context_with_prereqs();

        let err = stage.run(&mut ctx, &interact).await.unwrap_err();
        assert!(matches!(err, LaunchpadError::Process { .. }));
    }
}
