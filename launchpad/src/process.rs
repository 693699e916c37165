//! External process execution.
//!
//! Commands are described declaratively and run through the
//! [`CommandRunner`] trait so stages can be tested with a scripted
//! fake. The tokio-backed implementation streams combined
//! stdout/stderr lines to the interaction surface while awaiting exit
//! and fails on any non-zero status.

use crate::errors::{LaunchpadError, Result};
use crate::interact::Interaction;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// A command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to invoke.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory, when not the current one.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Creates a command spec.
    #[must_use]
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Captured result of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The captured stdout.
    pub stdout: String,
}

/// Runs external commands on behalf of stages.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `spec`, streaming output to `interact`, failing on non-zero
    /// exit.
    async fn run(
        &self,
        interact: &dyn Interaction,
        spec: CommandSpec,
    ) -> Result<CommandOutput>;
}

/// Tokio-backed command runner used by the binary.
#[derive(Debug, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    /// Creates a new runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        interact: &dyn Interaction,
        spec: CommandSpec,
    ) -> Result<CommandOutput> {
        debug!(program = %spec.program, args = ?spec.args, "spawning command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            LaunchpadError::Io(std::io::Error::other("failed to capture stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            LaunchpadError::Io(std::io::Error::other("failed to capture stderr"))
        })?;

        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();
        let mut out_done = false;
        let mut err_done = false;
        let mut captured = String::new();

        // Drain both streams to the reporting surface until exhausted.
        while !(out_done && err_done) {
            tokio::select! {
                line = out_lines.next_line(), if !out_done => match line? {
                    Some(line) => {
                        interact.emit(&line);
                        captured.push_str(&line);
                        captured.push('\n');
                    }
                    None => out_done = true,
                },
                line = err_lines.next_line(), if !err_done => match line? {
                    Some(line) => interact.emit(&line),
                    None => err_done = true,
                },
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(LaunchpadError::Process {
                program: spec.program,
                status: status.code().unwrap_or(-1),
            });
        }

        Ok(CommandOutput { stdout: captured })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInteraction;

    #[test]
    fn spec_builder_collects_cwd_and_env() {
        let spec = CommandSpec::new("git", &["init"])
            .cwd("/tmp/project")
            .env("GIT_DIR", ".git");

        assert_eq!(spec.program, "git");
        assert_eq!(spec.args, vec!["init".to_string()]);
        assert_eq!(spec.cwd.as_deref(), Some(std::path::Path::new("/tmp/project")));
        assert_eq!(spec.env, vec![("GIT_DIR".to_string(), ".git".to_string())]);
    }

    #[tokio::test]
    async fn captures_stdout_and_streams_lines() {
        let runner = TokioCommandRunner::new();
        let interact = ScriptedInteraction::new();

        let output = runner
            .run(&interact, CommandSpec::new("echo", &["hello"]))
            .await
            .unwrap();

        assert_eq!(output.stdout.trim(), "hello");
        assert!(interact.emitted().contains(&"hello".to_string()));
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_process_error() {
        let runner = TokioCommandRunner::new();
        let interact = ScriptedInteraction::new();

        let err = runner
            .run(&interact, CommandSpec::new("false", &[]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LaunchpadError::Process { status: 1, .. }
        ));
    }
}
