//! Template expansion into the project directory.

use crate::context::Context;
use crate::errors::Result;
use crate::interact::Interaction;
use crate::process::{CommandRunner, CommandSpec};
use crate::stage::{Stage, StageOutcome};
use crate::template::TemplateRenderer;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Expands the template tree into the project directory and installs
/// dependencies.
pub struct SynthStage {
    renderer: Arc<dyn TemplateRenderer>,
    runner: Arc<dyn CommandRunner>,
    source: PathBuf,
}

impl SynthStage {
    /// Creates the stage expanding `source`.
    #[must_use]
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        runner: Arc<dyn CommandRunner>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            renderer,
            runner,
            source: source.into(),
        }
    }
}

#[async_trait]
impl Stage for SynthStage {
    fn title(&self) -> &str {
        "Synth project"
    }

    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        let project = ctx.require_project()?.clone();
        let data = ctx.template_data();

        self.renderer
            .expand(&self.source, &project.path, &data)
            .await?;

        self.runner
            .run(
                interact,
                CommandSpec::new("pnpm", &["install"]).cwd(&project.path),
            )
            .await?;

        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Project;
    use crate::testing::{RecordingRenderer, RecordingRunner, ScriptedInteraction};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn expands_template_with_context_data_then_installs() {
        let renderer = Arc::new(RecordingRenderer::new());
        let runner = Arc::new(RecordingRunner::new());
        let stage = SynthStage::new(
            Arc::clone(&renderer) as Arc<dyn TemplateRenderer>,
            Arc::clone(&runner) as Arc<dyn CommandRunner>,
            "/templates/app",
        );
        let interact = ScriptedInteraction::new();
        let mut ctx = Context::default();
        ctx.set_project(Project {
            name: "widgets".to_string(),
            path: PathBuf::from("/tmp/widgets"),
        });

        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::Completed);

        let calls = renderer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/templates/app"));
        assert_eq!(calls[0].1, PathBuf::from("/tmp/widgets"));
        assert_eq!(calls[0].2["project"]["name"], "widgets");

        assert_eq!(runner.calls(), vec!["pnpm install".to_string()]);
        assert_eq!(
            runner.specs()[0].cwd.as_deref(),
            Some(std::path::Path::new("/tmp/widgets"))
        );
    }

    #[tokio::test]
    async fn requires_the_project_stage_to_have_run() {
        let renderer = Arc::new(RecordingRenderer::new());
        let runner = Arc::new(RecordingRunner::new());
        let stage = SynthStage::new(renderer, runner, "/templates/app");
        let interact = ScriptedInteraction::new();
        let mut ctx = Context::default();

        let err = stage.run(&mut ctx, &interact).await.unwrap_err();
        assert!(err.to_string().contains("project"));
    }
}
