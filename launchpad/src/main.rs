//! Command-line entry point.

use anyhow::Result;
use clap::Parser;
use launchpad::prelude::*;
use semver::Version;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Scaffold a new project with Bitbucket and AWS wiring.
#[derive(Debug, Parser)]
#[command(name = "launchpad", version, about)]
struct Cli {
    /// Project name (prompted for when omitted).
    name: Option<String>,

    /// Template directory to expand into the new project.
    #[arg(long, default_value = "template")]
    template: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
    let provider: Arc<dyn CloudProvider> =
        Arc::new(CliCloudProvider::new(Arc::clone(&runner)));
    let tokens: Arc<dyn TokenSource> = Arc::new(EnvTokenSource::new());
    let renderer: Arc<dyn TemplateRenderer> = Arc::new(VerbatimRenderer::new());

    let pipeline = Pipeline::new(vec![
        Box::new(ToolchainStage::new(
            Arc::clone(&runner),
            Version::new(10, 0, 0),
        )),
        Box::new(ProjectStage::new(Arc::clone(&runner))),
        Box::new(AwsEnvStage::new(Arc::clone(&provider))),
        Box::new(BitbucketRepositoryStage::new(Arc::clone(&tokens))),
        Box::new(DeployRoleStage::new(Arc::clone(&provider))),
        Box::new(SynthStage::new(renderer, Arc::clone(&runner), cli.template)),
        Box::new(VariablesStage::new()),
        Box::new(GitStage::new(Arc::clone(&runner))),
    ]);

    let interaction = ConsoleInteraction::new();
    let mut ctx = Context::new(cli.name);
    let report = pipeline.run(&mut ctx, &interaction).await;

    match report.failure {
        None => {
            interaction.emit("Project creation successful.");
            Ok(())
        }
        Some(message) => {
            interaction.emit(&message);
            std::process::exit(1);
        }
    }
}
