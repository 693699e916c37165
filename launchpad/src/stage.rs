//! Stage trait and execution outcomes.
//!
//! A stage is a titled unit of work over the shared context. Stages
//! either complete (mutating the context), skip with a reason, or fail
//! with an error that halts the pipeline.

use crate::context::Context;
use crate::errors::{LaunchpadError, Result};
use crate::interact::Interaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The successful outcomes of a stage run.
///
/// Failure is carried in the `Err` branch of [`Stage::run`]'s result so
/// stages can propagate collaborator errors with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage did its work and mutated the context.
    Completed,
    /// The stage deliberately did nothing; the reason feeds the report.
    Skipped(String),
}

impl StageOutcome {
    /// Creates a skip outcome with a reason.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }
}

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Returns the human-readable title of the stage.
    fn title(&self) -> &str;

    /// Executes the stage against the shared context.
    async fn run(
        &self,
        ctx: &mut Context,
        interact: &dyn Interaction,
    ) -> Result<StageOutcome>;
}

/// The reporting state of a stage within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started (or never will, because an earlier stage failed).
    Pending,
    /// Stage is currently running.
    Running,
    /// Stage completed successfully.
    Completed,
    /// Stage was skipped.
    Skipped,
    /// Stage failed, halting the pipeline.
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::Failed)
    }
}

/// Per-stage entry in the pipeline report.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// The stage title.
    pub title: String,
    /// The final (or pending) status.
    pub status: StageStatus,
    /// Skip reason or failure message, when present.
    pub message: Option<String>,
}

impl StageReport {
    pub(crate) fn pending(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: StageStatus::Pending,
            message: None,
        }
    }

    pub(crate) fn completed(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: StageStatus::Completed,
            message: None,
        }
    }

    pub(crate) fn skipped(title: impl Into<String>, reason: String) -> Self {
        Self {
            title: title.into(),
            status: StageStatus::Skipped,
            message: Some(reason),
        }
    }

    pub(crate) fn failed(title: impl Into<String>, error: &LaunchpadError) -> Self {
        Self {
            title: title.into(),
            status: StageStatus::Failed,
            message: Some(error.to_string()),
        }
    }
}

/// A simple closure-backed stage, mainly useful in tests.
pub struct FnStage<F>
where
    F: Fn(&mut Context) -> Result<StageOutcome> + Send + Sync,
{
    title: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut Context) -> Result<StageOutcome> + Send + Sync,
{
    /// Creates a new closure-backed stage.
    pub fn new(title: impl Into<String>, func: F) -> Self {
        Self {
            title: title.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&mut Context) -> Result<StageOutcome> + Send + Sync,
{
    fn title(&self) -> &str {
        &self.title
    }

    async fn run(
        &self,
        ctx: &mut Context,
        _interact: &dyn Interaction,
    ) -> Result<StageOutcome> {
        (self.func)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInteraction;

    #[test]
    fn stage_status_display() {
        assert_eq!(StageStatus::Completed.to_string(), "completed");
        assert_eq!(StageStatus::Skipped.to_string(), "skipped");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn stage_status_terminal() {
        assert!(StageStatus::Completed.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
    }

    #[tokio::test]
    async fn fn_stage_runs_closure() {
        let stage = FnStage::new("noop", |_ctx| Ok(StageOutcome::Completed));
        let mut ctx = Context::default();
        let interact = ScriptedInteraction::new();

        assert_eq!(stage.title(), "noop");
        let outcome = stage.run(&mut ctx, &interact).await.unwrap();
        assert_eq!(outcome, StageOutcome::Completed);
    }
}
