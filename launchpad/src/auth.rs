//! Out-of-band access credential acquisition.

use crate::errors::{LaunchpadError, Result};
use async_trait::async_trait;

/// Source of the bearer credential for the repository provider.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtains an access token.
    async fn access_token(&self) -> Result<String>;
}

/// Token source reading `BITBUCKET_ACCESS_TOKEN` from the environment.
#[derive(Debug, Default)]
pub struct EnvTokenSource;

impl EnvTokenSource {
    /// Creates the environment-backed token source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenSource for EnvTokenSource {
    async fn access_token(&self) -> Result<String> {
        match std::env::var("BITBUCKET_ACCESS_TOKEN") {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(LaunchpadError::validation(
                "BITBUCKET_ACCESS_TOKEN is not set; create a repository access token and export it",
            )),
        }
    }
}

/// Fixed token source for tests.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Creates a source always returning `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
