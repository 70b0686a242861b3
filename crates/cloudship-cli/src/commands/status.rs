use cloudship_cloud::GcloudClient;
use cloudship_core::CloudshipConfig;
use std::path::Path;

pub async fn status(project_dir: &Path) -> anyhow::Result<()> {
    let config = CloudshipConfig::load_with_env(project_dir)?;
    let project_id = config.project_id()?;
    let service_name = config.service_name(project_dir)?;
    let region = &config.project.region;

    let client = GcloudClient::new();
    let status = client
        .describe_service(&service_name, project_id, region)
        .await?;

    println!("Service:  {service_name} ({region})");
    println!("{status}");
    Ok(())
}
