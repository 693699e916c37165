//! Cloud deployment collaborator.
//!
//! The pipeline treats the cloud side as an opaque contract: check the
//! caller identity, bootstrap an account/region pair once, and deploy a
//! trust stack that declares named string outputs. The CLI-backed
//! implementation shells out through the [`CommandRunner`]; tests use
//! [`crate::testing::StaticCloudProvider`].

use crate::errors::{LaunchpadError, Result};
use crate::interact::Interaction;
use crate::process::{CommandRunner, CommandSpec};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Description of the trust stack to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStack {
    /// The CloudFormation stack name.
    pub stack_name: String,
    /// The project name the role is scoped to.
    pub project: String,
    /// The repository identity trusted by the role.
    pub repository_uuid: String,
    /// The region to deploy into.
    pub region: String,
}

/// Cloud-side operations the pipeline depends on.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Resolves the account id of the active credentials.
    async fn caller_account(&self, interact: &dyn Interaction) -> Result<String>;

    /// Runs one-time environment initialization for an account/region.
    async fn bootstrap(
        &self,
        interact: &dyn Interaction,
        account_id: &str,
        region: &str,
    ) -> Result<()>;

    /// Deploys the trust stack and returns its declared named outputs.
    async fn deploy_trust_stack(
        &self,
        interact: &dyn Interaction,
        stack: &TrustStack,
    ) -> Result<HashMap<String, String>>;
}

/// Extracts a named output, failing with the missing key by name.
pub fn require_output<'a>(
    outputs: &'a HashMap<String, String>,
    stack: &str,
    key: &str,
) -> Result<&'a str> {
    outputs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| LaunchpadError::MissingStackOutput {
            stack: stack.to_string(),
            key: key.to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct DescribeStacksResponse {
    #[serde(rename = "Stacks", default)]
    stacks: Vec<StackDescription>,
}

#[derive(Debug, Deserialize)]
struct StackDescription {
    #[serde(rename = "Outputs", default)]
    outputs: Vec<StackOutput>,
}

#[derive(Debug, Deserialize)]
struct StackOutput {
    #[serde(rename = "OutputKey")]
    key: Option<String>,
    #[serde(rename = "OutputValue")]
    value: Option<String>,
}

/// Cloud provider backed by the AWS and CDK command-line tools.
pub struct CliCloudProvider {
    runner: Arc<dyn CommandRunner>,
}

impl CliCloudProvider {
    /// Creates a provider shelling out through `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl CloudProvider for CliCloudProvider {
    async fn caller_account(&self, interact: &dyn Interaction) -> Result<String> {
        let output = self
            .runner
            .run(
                interact,
                CommandSpec::new(
                    "aws",
                    &["sts", "get-caller-identity", "--query", "Account", "--output", "text"],
                ),
            )
            .await
            .map_err(|_| {
                LaunchpadError::validation(
                    "could not determine the AWS account id, have you configured AWS credentials?",
                )
            })?;

        let account = output.stdout.trim().to_string();
        if account.is_empty() {
            return Err(LaunchpadError::validation(
                "identity response did not include an account id",
            ));
        }
        Ok(account)
    }

    async fn bootstrap(
        &self,
        interact: &dyn Interaction,
        account_id: &str,
        region: &str,
    ) -> Result<()> {
        self.runner
            .run(
                interact,
                CommandSpec::new(
                    "pnpm",
                    &["dlx", "aws-cdk@2", "bootstrap", &format!("aws://{account_id}/{region}")],
                )
                .env("AWS_REGION", region),
            )
            .await?;
        Ok(())
    }

    async fn deploy_trust_stack(
        &self,
        interact: &dyn Interaction,
        stack: &TrustStack,
    ) -> Result<HashMap<String, String>> {
        self.runner
            .run(
                interact,
                CommandSpec::new(
                    "pnpm",
                    &[
                        "dlx",
                        "@soliantconsulting/bitbucket-openid-connect@^1",
                        "deploy",
                        &stack.stack_name,
                        &stack.project,
                        &stack.repository_uuid,
                    ],
                )
                .env("AWS_REGION", &stack.region),
            )
            .await?;

        let described = self
            .runner
            .run(
                interact,
                CommandSpec::new(
                    "aws",
                    &[
                        "cloudformation",
                        "describe-stacks",
                        "--stack-name",
                        &stack.stack_name,
                        "--output",
                        "json",
                    ],
                )
                .env("AWS_REGION", &stack.region),
            )
            .await?;

        let response: DescribeStacksResponse = serde_json::from_str(&described.stdout)
            .map_err(|_| LaunchpadError::StackNotFound {
                stack: stack.stack_name.clone(),
            })?;
        let description =
            response
                .stacks
                .into_iter()
                .next()
                .ok_or_else(|| LaunchpadError::StackNotFound {
                    stack: stack.stack_name.clone(),
                })?;

        let mut outputs = HashMap::new();
        for output in description.outputs {
            if let (Some(key), Some(value)) = (output.key, output.value) {
                outputs.insert(key, value);
            }
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn require_output_returns_present_key() {
        let mut outputs = HashMap::new();
        outputs.insert("RoleArn".to_string(), "arn:aws:iam::1:role/x".to_string());

        let arn = require_output(&outputs, "trust", "RoleArn").unwrap();
        assert_eq!(arn, "arn:aws:iam::1:role/x");
    }

    #[test]
    fn require_output_names_the_missing_key() {
        let outputs = HashMap::new();
        let err = require_output(&outputs, "trust", "RoleArn").unwrap_err();
        assert!(matches!(
            err,
            LaunchpadError::MissingStackOutput { .. }
        ));
        assert!(err.to_string().contains("RoleArn"));
    }

    #[test]
    fn describe_stacks_outputs_parse_into_flat_map() {
        let body = r#"{
            "Stacks": [{
                "Outputs": [
                    {"OutputKey": "RoleArn", "OutputValue": "arn:aws:iam::1:role/x"},
                    {"OutputKey": null, "OutputValue": "ignored"}
                ]
            }]
        }"#;
        let parsed: DescribeStacksResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.stacks.len(), 1);
        assert_eq!(parsed.stacks[0].outputs.len(), 2);
        assert_eq!(
            parsed.stacks[0].outputs[0].key.as_deref(),
            Some("RoleArn")
        );
    }
}
