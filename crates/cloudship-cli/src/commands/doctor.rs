use cloudship_cloud::{CheckResult, DockerClient, GcloudClient};
use cloudship_core::CloudshipConfig;
use cloudship_core::config::CONFIG_FILE;
use std::path::Path;

pub async fn doctor(project_dir: &Path) -> anyhow::Result<()> {
    // Doctor reports a broken config instead of aborting on it.
    let (config, config_check) = match CloudshipConfig::load_with_env(project_dir) {
        Ok(config) if project_dir.join(CONFIG_FILE).exists() => {
            (Some(config), CheckResult::ok("Found"))
        }
        Ok(config) => (Some(config), CheckResult::ok("Not found, using defaults")),
        Err(e) => (None, CheckResult::fail(&e.to_string())),
    };
    let project_id = config
        .as_ref()
        .and_then(|c| c.project.project_id.as_deref());

    let mut report = GcloudClient::new().doctor(project_id).await;

    report.docker = match DockerClient::new().version().await {
        Ok(version) => CheckResult::ok(&version),
        Err(e) => CheckResult::fail(&e.to_string()),
    };
    report.config_file = config_check;

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed — see above for details");
    }

    Ok(())
}
