mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cloudship",
    about = "Build a container image and deploy it to Cloud Run"
)]
#[command(version)]
struct Cli {
    /// Project directory containing cloudship.toml
    #[arg(long, short = 'C', global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline: naming, repository, build & push, deploy
    Deploy,
    /// Run a single pipeline step, sharing names through an env file
    Step {
        #[command(subcommand)]
        step: StepAction,
    },
    /// Show the deployed Cloud Run service
    Status,
    /// Check gcloud, docker and GCP project readiness
    Doctor,
}

#[derive(Subcommand)]
enum StepAction {
    /// Compute resource names; append them to the env file or print them
    Naming {
        #[arg(long, env = "CLOUDSHIP_ENV_FILE")]
        env_file: Option<PathBuf>,
    },
    /// Create the Artifact Registry repository if it does not exist
    EnsureRepo {
        #[arg(long, env = "CLOUDSHIP_ENV_FILE")]
        env_file: PathBuf,
    },
    /// Build the container image and push it to the registry
    BuildPush {
        #[arg(long, env = "CLOUDSHIP_ENV_FILE")]
        env_file: PathBuf,
    },
    /// Deploy the pushed image to Cloud Run
    Deploy {
        #[arg(long, env = "CLOUDSHIP_ENV_FILE")]
        env_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dir = cli.dir.as_path();

    match cli.command {
        Commands::Deploy => commands::deploy(dir).await?,
        Commands::Step { step } => match step {
            StepAction::Naming { env_file } => commands::step_naming(dir, env_file.as_deref())?,
            StepAction::EnsureRepo { env_file } => {
                commands::step_ensure_repo(dir, &env_file).await?
            }
            StepAction::BuildPush { env_file } => commands::step_build_push(dir, &env_file).await?,
            StepAction::Deploy { env_file } => commands::step_deploy(dir, &env_file).await?,
        },
        Commands::Status => commands::status(dir).await?,
        Commands::Doctor => commands::doctor(dir).await?,
    }

    Ok(())
}
