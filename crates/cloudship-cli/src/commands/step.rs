//! One pipeline step per invocation.
//!
//! `step naming` appends the build context to the shared env file; the
//! later steps read it back instead of recomputing it, so every step of one
//! run sees the same names.

use super::pipeline::Pipeline;
use cloudship_cloud::{DockerClient, GcloudClient};
use cloudship_core::{BuildContext, CloudshipConfig, EnvFile};
use std::path::Path;

pub fn step_naming(project_dir: &Path, env_file: Option<&Path>) -> anyhow::Result<()> {
    let config = CloudshipConfig::load_with_env(project_dir)?;
    let gcloud = GcloudClient::new();
    let docker = DockerClient::new();
    let context = Pipeline::new(&config, project_dir, &gcloud, &docker).compute_naming()?;

    match env_file {
        Some(path) => {
            context.write_to(&EnvFile::new(path))?;
            println!("Wrote build context to {}", path.display());
        }
        None => {
            for (key, value) in context.env_entries() {
                println!("{key}={value}");
            }
        }
    }

    Ok(())
}

pub async fn step_ensure_repo(project_dir: &Path, env_file: &Path) -> anyhow::Result<()> {
    let (config, context) = load(project_dir, env_file)?;
    let gcloud = GcloudClient::new();
    let docker = DockerClient::new();

    Pipeline::new(&config, project_dir, &gcloud, &docker)
        .ensure_repository(&context)
        .await?;
    Ok(())
}

pub async fn step_build_push(project_dir: &Path, env_file: &Path) -> anyhow::Result<()> {
    let (config, context) = load(project_dir, env_file)?;
    let gcloud = GcloudClient::new();
    let docker = DockerClient::new();

    Pipeline::new(&config, project_dir, &gcloud, &docker)
        .build_and_push(&context)
        .await
}

pub async fn step_deploy(project_dir: &Path, env_file: &Path) -> anyhow::Result<()> {
    let (config, context) = load(project_dir, env_file)?;
    let gcloud = GcloudClient::new();
    let docker = DockerClient::new();

    let url = Pipeline::new(&config, project_dir, &gcloud, &docker)
        .deploy(&context)
        .await?;
    println!("Deployed: {url}");
    Ok(())
}

fn load(project_dir: &Path, env_file: &Path) -> anyhow::Result<(CloudshipConfig, BuildContext)> {
    let config = CloudshipConfig::load_with_env(project_dir)?;
    let context = BuildContext::read_from(&EnvFile::new(env_file), config.project_id()?)?;
    tracing::debug!(image = %context.image_name, "build context loaded from env file");
    Ok((config, context))
}
