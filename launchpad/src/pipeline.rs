//! Sequential pipeline orchestration.
//!
//! The pipeline runs its stages strictly in declaration order. A skip
//! does not halt the run; the first failure does, leaving the remaining
//! stages pending. Effects already performed by completed stages are
//! not rolled back; partial provisioning is an accepted, user-visible
//! end state.

use crate::context::Context;
use crate::interact::Interaction;
use crate::stage::{Stage, StageOutcome, StageReport, StageStatus};
use tracing::{error, info, warn};

/// The result of a full pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Per-stage reports in declaration order.
    pub stages: Vec<StageReport>,
    /// The failing stage's message, when the run failed.
    pub failure: Option<String>,
}

impl PipelineReport {
    /// Returns true if no stage failed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// An ordered sequence of stages sharing one context.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Creates a pipeline from stages in execution order.
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs all stages sequentially against `ctx`.
    ///
    /// Only the failing stage's message reaches the report surface;
    /// stack traces stay in the logs.
    pub async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> PipelineReport {
        let mut reports: Vec<StageReport> = Vec::with_capacity(self.stages.len());
        let mut failure: Option<String> = None;

        for (index, stage) in self.stages.iter().enumerate() {
            if failure.is_some() {
                reports.push(StageReport::pending(stage.title()));
                continue;
            }

            let title = stage.title();
            info!(stage = title, status = %StageStatus::Running, "stage started");

            match stage.run(ctx, interact).await {
                Ok(StageOutcome::Completed) => {
                    info!(stage = title, "stage completed");
                    interact.emit(&format!("[done] {title}"));
                    reports.push(StageReport::completed(title));
                }
                Ok(StageOutcome::Skipped(reason)) => {
                    info!(stage = title, reason = %reason, "stage skipped");
                    interact.emit(&format!("[skip] {title}: {reason}"));
                    reports.push(StageReport::skipped(title, reason));
                }
                Err(err) => {
                    error!(stage = title, error = %err, "stage failed");
                    interact.emit(&format!("[fail] {title}: {err}"));
                    reports.push(StageReport::failed(title, &err));
                    failure = Some(err.to_string());

                    if index + 1 < self.stages.len() {
                        warn!(
                            remaining = self.stages.len() - index - 1,
                            "halting pipeline, remaining stages not run"
                        );
                    }
                }
            }
        }

        PipelineReport {
            stages: reports,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LaunchpadError;
    use crate::stage::FnStage;
    use crate::testing::ScriptedInteraction;
    use pretty_assertions::assert_eq;

    fn boxed<F>(title: &str, func: F) -> Box<dyn Stage>
    where
        F: Fn(&mut Context) -> crate::errors::Result<StageOutcome> + Send + Sync + 'static,
    {
        Box::new(FnStage::new(title, func))
    }

    #[tokio::test]
    async fn all_stages_complete_in_order() {
        let pipeline = Pipeline::new(vec![
            boxed("first", |ctx| {
                ctx.input_name = Some("touched".to_string());
                Ok(StageOutcome::Completed)
            }),
            boxed("second", |ctx| {
                assert_eq!(ctx.input_name.as_deref(), Some("touched"));
                Ok(StageOutcome::Completed)
            }),
        ]);

        let mut ctx = Context::default();
        let interact = ScriptedInteraction::new();
        let report = pipeline.run(&mut ctx, &interact).await;

        assert!(report.success());
        assert_eq!(report.stages.len(), 2);
        assert!(report
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Completed));
    }

    #[tokio::test]
    async fn skip_does_not_halt_the_pipeline() {
        let pipeline = Pipeline::new(vec![
            boxed("skipper", |_ctx| Ok(StageOutcome::skipped("declined"))),
            boxed("after", |_ctx| Ok(StageOutcome::Completed)),
        ]);

        let mut ctx = Context::default();
        let interact = ScriptedInteraction::new();
        let report = pipeline.run(&mut ctx, &interact).await;

        assert!(report.success());
        assert_eq!(report.stages[0].status, StageStatus::Skipped);
        assert_eq!(report.stages[0].message.as_deref(), Some("declined"));
        assert_eq!(report.stages[1].status, StageStatus::Completed);
    }

    #[tokio::test]
    async fn first_failure_halts_and_leaves_later_stages_pending() {
        let pipeline = Pipeline::new(vec![
            boxed("ok", |_ctx| Ok(StageOutcome::Completed)),
            boxed("boom", |_ctx| {
                Err(LaunchpadError::validation("bad input"))
            }),
            boxed("never", |_ctx| {
                panic!("must not run after a failure");
            }),
        ]);

        let mut ctx = Context::default();
        let interact = ScriptedInteraction::new();
        let report = pipeline.run(&mut ctx, &interact).await;

        assert!(!report.success());
        assert_eq!(report.failure.as_deref(), Some("bad input"));
        assert_eq!(report.stages[0].status, StageStatus::Completed);
        assert_eq!(report.stages[1].status, StageStatus::Failed);
        assert_eq!(report.stages[1].message.as_deref(), Some("bad input"));
        assert_eq!(report.stages[2].status, StageStatus::Pending);
    }

    #[tokio::test]
    async fn report_surface_carries_stage_lines() {
        let pipeline = Pipeline::new(vec![boxed("only", |_ctx| {
            Ok(StageOutcome::Completed)
        })]);

        let mut ctx = Context::default();
        let interact = ScriptedInteraction::new();
        pipeline.run(&mut ctx, &interact).await;

        let lines = interact.emitted();
        assert_eq!(lines, vec!["[done] only".to_string()]);
    }
}
