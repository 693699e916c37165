//! The stages composing the project creation pipeline, in their
//! declaration order: toolchain check, project directory, AWS
//! environment, Bitbucket repository, deployment role, template synth,
//! pipeline variables, git initialization.

mod aws_env;
mod bitbucket_repository;
mod deploy_role;
mod git;
mod project;
mod synth;
mod toolchain;
mod variables;

pub use aws_env::AwsEnvStage;
pub use bitbucket_repository::BitbucketRepositoryStage;
pub use deploy_role::DeployRoleStage;
pub use git::GitStage;
pub use project::ProjectStage;
pub use synth::SynthStage;
pub use toolchain::ToolchainStage;
pub use variables::VariablesStage;
