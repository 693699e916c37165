//! Bitbucket Cloud REST client.
//!
//! Thin client over the 2.0 API carrying a bearer credential on every
//! call and JSON bodies on every mutation. Variable collections come in
//! two equivalent shapes, repository-scoped and environment-scoped,
//! both exposed as [`VariableStore`] handles for the synchronizer.

use crate::errors::{LaunchpadError, Result};
use crate::remote::sync::{CreateOutcome, VariablePage, VariableSpec, VariableStore};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// A repository deployment environment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Environment {
    /// The environment's stable identifier.
    pub uuid: String,
    /// The environment type (e.g. "deployment_environment").
    #[serde(rename = "type")]
    pub kind: String,
    /// The display name.
    pub name: String,
}

/// Workspace and repository slugs parsed from a clone URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCoordinates {
    /// The workspace slug.
    pub workspace: String,
    /// The repository slug.
    pub repository: String,
}

/// Parses an SSH or HTTPS Bitbucket clone URL.
///
/// The pattern is strict: anything that does not carry
/// `@bitbucket.org` followed by `workspace/repository.git` is rejected
/// outright, there is no best-effort parse.
pub fn parse_clone_url(input: &str) -> Result<RepositoryCoordinates> {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    let pattern = Regex::new(r"@bitbucket\.org[:/]([^/]+)/(.+)\.git").unwrap();

    let captures = pattern
        .captures(input)
        .ok_or_else(|| LaunchpadError::InvalidCloneUrl {
            input: input.to_string(),
        })?;

    Ok(RepositoryCoordinates {
        workspace: captures[1].to_string(),
        repository: captures[2].to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct EnvironmentsResponse {
    values: Vec<Environment>,
}

#[derive(Debug, Serialize)]
struct PipelinesConfigBody {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct VariableEntry {
    uuid: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct VariableListResponse {
    values: Vec<VariableEntry>,
    next: Option<String>,
}

// Conflict body contract: `error.data.arguments.externalId` names the
// existing resource. Treated as versioned; see the compatibility test.
#[derive(Debug, Deserialize)]
struct ConflictBody {
    error: Option<ConflictError>,
}

#[derive(Debug, Deserialize)]
struct ConflictError {
    data: Option<ConflictData>,
}

#[derive(Debug, Deserialize)]
struct ConflictData {
    arguments: Option<ConflictArguments>,
}

#[derive(Debug, Deserialize)]
struct ConflictArguments {
    #[serde(rename = "externalId")]
    external_id: Option<String>,
}

/// Client for one Bitbucket repository.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    workspace: String,
    repo_slug: String,
}

impl BitbucketClient {
    /// Creates a client against the public Bitbucket API.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        workspace: impl Into<String>,
        repo_slug: impl Into<String>,
    ) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, access_token, workspace, repo_slug)
    }

    /// Creates a client against a custom base URL (used by tests).
    #[must_use]
    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        workspace: impl Into<String>,
        repo_slug: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
            workspace: workspace.into(),
            repo_slug: repo_slug.into(),
        }
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repositories/{}/{}{}",
            self.base_url, self.workspace, self.repo_slug, suffix
        )
    }

    /// Resolves the repository's stable identifier.
    pub async fn repository_uuid(&self) -> Result<String> {
        let response = self
            .http
            .get(self.repo_url(""))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchpadError::UnexpectedStatus {
                status: response.status().as_u16(),
                action: "fetch repository".to_string(),
            });
        }

        let body: RepositoryResponse = response.json().await?;
        Ok(body.uuid)
    }

    /// Enables the repository's build pipeline.
    pub async fn enable_pipeline(&self) -> Result<()> {
        let response = self
            .http
            .put(self.repo_url("/pipelines_config"))
            .bearer_auth(&self.access_token)
            .json(&PipelinesConfigBody { enabled: true })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchpadError::UnexpectedStatus {
                status: response.status().as_u16(),
                action: "enable pipeline".to_string(),
            });
        }

        Ok(())
    }

    /// Lists the repository's deployment environments.
    pub async fn environments(&self) -> Result<Vec<Environment>> {
        let response = self
            .http
            .get(self.repo_url("/environments"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchpadError::UnexpectedStatus {
                status: response.status().as_u16(),
                action: "fetch environments".to_string(),
            });
        }

        let body: EnvironmentsResponse = response.json().await?;
        Ok(body.values)
    }

    /// Handle over the repository-scoped variable collection.
    #[must_use]
    pub fn repository_variables(&self) -> VariableCollection {
        VariableCollection {
            client: self.clone(),
            base: self.repo_url("/pipelines_config/variables/"),
        }
    }

    /// Handle over an environment-scoped variable collection.
    #[must_use]
    pub fn environment_variables(&self, env_uuid: &str) -> VariableCollection {
        VariableCollection {
            client: self.clone(),
            base: self.repo_url(&format!(
                "/deployments_config/environments/{env_uuid}/variables/"
            )),
        }
    }
}

/// One variable collection (repository- or environment-scoped).
#[derive(Debug, Clone)]
pub struct VariableCollection {
    client: BitbucketClient,
    base: String,
}

#[async_trait]
impl VariableStore for VariableCollection {
    async fn list_page(&self, cursor: Option<&str>) -> Result<VariablePage> {
        // `next` is a fully-qualified URL on subsequent pages.
        let url = cursor.unwrap_or(self.base.as_str());
        let response = self
            .client
            .http
            .get(url)
            .bearer_auth(&self.client.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchpadError::UnexpectedStatus {
                status: response.status().as_u16(),
                action: "list variables".to_string(),
            });
        }

        let body: VariableListResponse = response.json().await?;
        Ok(VariablePage {
            entries: body
                .values
                .into_iter()
                .map(|entry| (entry.key, entry.uuid))
                .collect(),
            next: body.next,
        })
    }

    async fn create(&self, spec: &VariableSpec) -> Result<CreateOutcome> {
        let response = self
            .client
            .http
            .post(&self.base)
            .bearer_auth(&self.client.access_token)
            .json(&serde_json::json!({
                "key": spec.key,
                "value": spec.value,
                "secured": spec.secured,
            }))
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 409 {
            let text = response.text().await.unwrap_or_default();
            return parse_conflict(&spec.key, &text);
        }

        if !status.is_success() {
            return Err(LaunchpadError::UnexpectedStatus {
                status: status.as_u16(),
                action: format!("create variable '{}'", spec.key),
            });
        }

        Ok(CreateOutcome::Created)
    }

    async fn update(&self, id: &str, spec: &VariableSpec) -> Result<()> {
        let response = self
            .client
            .http
            .put(format!("{}{id}", self.base))
            .bearer_auth(&self.client.access_token)
            .json(&serde_json::json!({
                "key": spec.key,
                "value": spec.value,
                "secured": spec.secured,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchpadError::UnexpectedStatus {
                status: response.status().as_u16(),
                action: format!("update variable '{}'", spec.key),
            });
        }

        Ok(())
    }
}

fn parse_conflict(key: &str, body: &str) -> Result<CreateOutcome> {
    let parsed: ConflictBody =
        serde_json::from_str(body).map_err(|e| LaunchpadError::UnresolvedConflict {
            key: key.to_string(),
            detail: format!("conflict body is not valid JSON: {e}"),
        })?;

    let external_id = parsed
        .error
        .and_then(|e| e.data)
        .and_then(|d| d.arguments)
        .and_then(|a| a.external_id)
        .ok_or_else(|| LaunchpadError::UnresolvedConflict {
            key: key.to_string(),
            detail: "conflict body is missing error.data.arguments.externalId".to_string(),
        })?;

    Ok(CreateOutcome::Conflict {
        existing_id: external_id,
    })
}
