//! Shared pipeline context.
//!
//! The context is a single record threaded through the pipeline. Each
//! stage reads the fields it depends on and writes the field it
//! produces. Stages run strictly sequentially, so the context has
//! exactly one writer at any instant and needs no locking.
//!
//! A field is in one of three states: not yet produced (accessing it is
//! a pipeline ordering bug), produced as [`Feature::Enabled`] with a
//! payload, or produced as [`Feature::Disabled`] recording a deliberate
//! user choice to skip the capability. Downstream stages must match on
//! the disabled case explicitly; it is authorization to no-op, not a
//! missing-data error.

use crate::errors::{LaunchpadError, Result};
use std::path::PathBuf;

/// A capability that the user either configured or deliberately declined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature<T> {
    /// The capability was configured; payload describes what was provisioned.
    Enabled(T),
    /// The user declined the capability; the reason feeds skip messages.
    Disabled(String),
}

impl<T> Feature<T> {
    /// Creates a disabled marker with a reason.
    #[must_use]
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::Disabled(reason.into())
    }

    /// Returns the payload if the feature is enabled.
    #[must_use]
    pub fn enabled(&self) -> Option<&T> {
        match self {
            Self::Enabled(payload) => Some(payload),
            Self::Disabled(_) => None,
        }
    }

    /// Returns true if the feature was declined.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled(_))
    }
}

/// The project directory produced by the project stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// The project name.
    pub name: String,
    /// Absolute path of the created directory.
    pub path: PathBuf,
}

/// A provisioned AWS environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsEnv {
    /// The AWS account id resolved from the caller identity.
    pub account_id: String,
    /// The bootstrapped region.
    pub region: String,
}

/// A linked Bitbucket repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketRepository {
    /// Bearer credential for the REST API.
    pub access_token: String,
    /// Workspace slug parsed from the clone URL.
    pub workspace: String,
    /// Repository slug parsed from the clone URL.
    pub repository: String,
    /// The repository's stable identifier.
    pub repository_uuid: String,
}

/// A provisioned deployment trust role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRole {
    /// ARN of the role the build pipeline assumes.
    pub arn: String,
}

/// The mutable record threaded through a single pipeline run.
///
/// Created once per run and discarded at process exit; never
/// serialized.
#[derive(Debug, Default)]
pub struct Context {
    /// Optional project name supplied on the command line.
    pub input_name: Option<String>,
    project: Option<Project>,
    aws_env: Option<Feature<AwsEnv>>,
    bitbucket_repository: Option<Feature<BitbucketRepository>>,
    deploy_role: Option<Feature<DeployRole>>,
}

impl Context {
    /// Creates a fresh context, seeding the optional CLI-provided name.
    #[must_use]
    pub fn new(input_name: Option<String>) -> Self {
        Self {
            input_name,
            ..Self::default()
        }
    }

    /// Records the project directory.
    pub fn set_project(&mut self, project: Project) {
        self.project = Some(project);
    }

    /// Records the AWS environment result.
    pub fn set_aws_env(&mut self, aws_env: Feature<AwsEnv>) {
        self.aws_env = Some(aws_env);
    }

    /// Records the Bitbucket repository result.
    pub fn set_bitbucket_repository(&mut self, repository: Feature<BitbucketRepository>) {
        self.bitbucket_repository = Some(repository);
    }

    /// Records the deployment role result.
    pub fn set_deploy_role(&mut self, role: Feature<DeployRole>) {
        self.deploy_role = Some(role);
    }

    /// Returns the project, failing if the project stage has not run.
    pub fn require_project(&self) -> Result<&Project> {
        self.project
            .as_ref()
            .ok_or(LaunchpadError::MissingContext { field: "project" })
    }

    /// Returns the AWS environment result, failing if its stage has not run.
    pub fn require_aws_env(&self) -> Result<&Feature<AwsEnv>> {
        self.aws_env
            .as_ref()
            .ok_or(LaunchpadError::MissingContext { field: "aws_env" })
    }

    /// Returns the Bitbucket result, failing if its stage has not run.
    pub fn require_bitbucket_repository(&self) -> Result<&Feature<BitbucketRepository>> {
        self.bitbucket_repository
            .as_ref()
            .ok_or(LaunchpadError::MissingContext {
                field: "bitbucket_repository",
            })
    }

    /// Returns the deploy role result, failing if its stage has not run.
    pub fn require_deploy_role(&self) -> Result<&Feature<DeployRole>> {
        self.deploy_role
            .as_ref()
            .ok_or(LaunchpadError::MissingContext {
                field: "deploy_role",
            })
    }

    /// JSON view of the context handed to the template renderer.
    ///
    /// Disabled features render as `null` so templates can branch on
    /// their presence.
    #[must_use]
    pub fn template_data(&self) -> serde_json::Value {
        let project = self.project.as_ref().map(|p| {
            serde_json::json!({
                "name": p.name,
                "path": p.path.to_string_lossy(),
            })
        });
        let aws_env = self.aws_env.as_ref().and_then(Feature::enabled).map(|e| {
            serde_json::json!({
                "accountId": e.account_id,
                "region": e.region,
            })
        });
        let bitbucket = self
            .bitbucket_repository
            .as_ref()
            .and_then(Feature::enabled)
            .map(|r| {
                serde_json::json!({
                    "workspace": r.workspace,
                    "repository": r.repository,
                    "repositoryUuid": r.repository_uuid,
                })
            });
        let deploy_role = self
            .deploy_role
            .as_ref()
            .and_then(Feature::enabled)
            .map(|r| serde_json::json!({ "arn": r.arn }));

        serde_json::json!({
            "project": project,
            "awsEnv": aws_env,
            "bitbucketRepository": bitbucket,
            "deployRole": deploy_role,
        })
    }
}
