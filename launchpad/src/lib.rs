//! # Launchpad
//!
//! An interactive project scaffolding pipeline: it prompts for
//! configuration, provisions a Bitbucket repository and an AWS trust
//! role, expands a template tree into a new directory, and wires the
//! generated infrastructure together through shared pipeline state.
//!
//! The crate is built around two mechanisms:
//!
//! - **Pipeline orchestration**: dependent, skippable [`stage::Stage`]s
//!   run strictly sequentially over one shared [`context::Context`].
//!   A declined capability is recorded as [`context::Feature::Disabled`]
//!   and cascades as skips through every dependent stage.
//! - **Remote synchronization**: [`remote::VariableSync`] ensures
//!   remote key-value resources match desired values with one memoized
//!   listing per collection and automatic conflict reconciliation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use launchpad::prelude::*;
//!
//! let pipeline = Pipeline::new(vec![
//!     Box::new(ProjectStage::new(runner.clone())),
//!     Box::new(AwsEnvStage::new(provider.clone())),
//!     Box::new(BitbucketRepositoryStage::new(tokens.clone())),
//!     Box::new(DeployRoleStage::new(provider.clone())),
//!     Box::new(GitStage::new(runner.clone())),
//! ]);
//!
//! let mut ctx = Context::new(name);
//! let report = pipeline.run(&mut ctx, &interaction).await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod auth;
pub mod cloud;
pub mod context;
pub mod errors;
pub mod interact;
pub mod pipeline;
pub mod process;
pub mod remote;
pub mod stage;
pub mod stages;
pub mod template;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{EnvTokenSource, TokenSource};
    pub use crate::cloud::{CliCloudProvider, CloudProvider, TrustStack};
    pub use crate::context::{
        AwsEnv, BitbucketRepository, Context, DeployRole, Feature, Project,
    };
    pub use crate::errors::{LaunchpadError, Result};
    pub use crate::interact::{ConsoleInteraction, Interaction};
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::process::{
        CommandOutput, CommandRunner, CommandSpec, TokioCommandRunner,
    };
    pub use crate::remote::{
        parse_clone_url, BitbucketClient, VariableSpec, VariableStore, VariableSync,
    };
    pub use crate::stage::{Stage, StageOutcome, StageReport, StageStatus};
    pub use crate::stages::{
        AwsEnvStage, BitbucketRepositoryStage, DeployRoleStage, GitStage, ProjectStage,
        SynthStage, ToolchainStage, VariablesStage,
    };
    pub use crate::template::{TemplateRenderer, VerbatimRenderer};
}
