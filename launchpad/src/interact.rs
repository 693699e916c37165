//! The per-stage user interaction surface.
//!
//! Stages never talk to the terminal directly; they receive an
//! [`Interaction`] capability that can ask a yes/no toggle, ask for a
//! line of text, and carry streamed subprocess output. Supplying a
//! scripted fake (see [`crate::testing::ScriptedInteraction`]) makes
//! every stage testable without a terminal.

use crate::errors::{LaunchpadError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Capability for prompting the user and reporting progress.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Asks a yes/no question, returning `default` on an empty answer.
    async fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Asks for a line of text, returning `default` on an empty answer
    /// when one is given.
    async fn input(&self, message: &str, default: Option<&str>) -> Result<String>;

    /// Emits a line to the reporting surface (stage progress, streamed
    /// subprocess output).
    fn emit(&self, line: &str);
}

/// Terminal-backed interaction used by the binary.
#[derive(Debug, Default)]
pub struct ConsoleInteraction;

impl ConsoleInteraction {
    /// Creates a new console interaction.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| LaunchpadError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(LaunchpadError::Prompt("stdin closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    async fn write_prompt(&self, prompt: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| LaunchpadError::Prompt(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| LaunchpadError::Prompt(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Interaction for ConsoleInteraction {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            self.write_prompt(&format!("{message} [{hint}] ")).await?;
            let answer = self.read_line().await?;
            match answer.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.emit("Please answer 'y' or 'n'."),
            }
        }
    }

    async fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(default) => format!("{message} [{default}] "),
            None => format!("{message} "),
        };
        loop {
            self.write_prompt(&prompt).await?;
            let answer = self.read_line().await?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if let Some(default) = default {
                return Ok(default.to_string());
            }
            self.emit("A value is required.");
        }
    }

    fn emit(&self, line: &str) {
        println!("{line}");
    }
}
