use super::pipeline::Pipeline;
use cloudship_cloud::{DockerClient, GcloudClient};
use cloudship_core::CloudshipConfig;
use std::path::Path;

/// Execute the full deploy pipeline in one process.
pub async fn deploy(project_dir: &Path) -> anyhow::Result<()> {
    let config = CloudshipConfig::load_with_env(project_dir)?;
    let gcloud = GcloudClient::new();
    let docker = DockerClient::new();

    let outcome = Pipeline::new(&config, project_dir, &gcloud, &docker)
        .run()
        .await?;

    let repository = if outcome.repository.created() {
        "created"
    } else {
        "reused"
    };

    println!();
    println!("Repository: {} ({repository})", outcome.context.repo_artifact);
    println!("Image:      {}", outcome.context.image_name);
    println!("Deployed:   {}", outcome.url);

    Ok(())
}
