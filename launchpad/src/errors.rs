//! Error types for the launchpad pipeline.
//!
//! The taxonomy mirrors the behaviors stages are allowed to exhibit:
//! fail-fast context access, input validation, remote conflicts, and
//! collaborator transport failures. Skips are not errors and never
//! appear here.

use thiserror::Error;

/// The main error type for launchpad operations.
#[derive(Debug, Error)]
pub enum LaunchpadError {
    /// A stage read a context field its producer never wrote.
    ///
    /// This indicates a pipeline ordering bug, not a runtime condition
    /// to recover from.
    #[error("context is missing field '{field}'")]
    MissingContext {
        /// The missing field name.
        field: &'static str,
    },

    /// User-supplied input or environment state failed validation.
    #[error("{0}")]
    Validation(String),

    /// A repository clone URL did not match the expected pattern.
    #[error("invalid repository clone URL: '{input}' (expected git@bitbucket.org:workspace/repository.git)")]
    InvalidCloneUrl {
        /// The rejected input.
        input: String,
    },

    /// A deployed stack did not declare an expected named output.
    #[error("stack '{stack}' is missing expected output '{key}'")]
    MissingStackOutput {
        /// The stack name.
        stack: String,
        /// The missing output key.
        key: String,
    },

    /// A stack could not be located after deployment.
    #[error("could not locate stack '{stack}'")]
    StackNotFound {
        /// The stack name.
        stack: String,
    },

    /// A create conflict whose cause could not be determined.
    ///
    /// The conflict body is a versioned contract; when it cannot be
    /// parsed into the expected shape the conflict must not be
    /// silently swallowed.
    #[error("conflict creating variable '{key}' could not be resolved: {detail}")]
    UnresolvedConflict {
        /// The variable key being created.
        key: String,
        /// What went wrong while interpreting the conflict.
        detail: String,
    },

    /// The remote API returned a non-success, non-conflict status.
    #[error("unexpected status {status} while trying to {action}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The attempted action, for the report surface.
        action: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An external command exited non-zero.
    #[error("command '{program}' exited with status {status}")]
    Process {
        /// The program that was run.
        program: String,
        /// The exit status code (-1 when terminated by signal).
        status: i32,
    },

    /// The interactive prompt surface failed (e.g. stdin closed).
    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl LaunchpadError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LaunchpadError>;
