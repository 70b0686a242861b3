//! Deterministic resource naming.
//!
//! All names used by the pipeline are derived here, once, from structured
//! inputs. Nothing downstream formats resource names on its own.

use crate::config::CloudshipConfig;
use crate::env_file::EnvFile;
use crate::{Error, Result};
use std::path::Path;

/// Artifact Registry Docker host suffix.
pub const REGISTRY_HOST_SUFFIX: &str = "docker.pkg.dev";

pub const KEY_REGION: &str = "REGION";
pub const KEY_REPO_ARTIFACT: &str = "REPO_ARTIFACT";
pub const KEY_IMAGE_REPO: &str = "IMAGE_REPO";
pub const KEY_SERVICE_NAME: &str = "SERVICE_NAME";
pub const KEY_IMAGE_NAME: &str = "IMAGE_NAME";

/// Names shared by every pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub project_id: String,
    pub region: String,
    pub repo_artifact: String,
    pub image_repo: String,
    pub service_name: String,
    pub image_name: String,
}

/// `<region>-docker.pkg.dev`
pub fn registry_host(region: &str) -> String {
    format!("{region}-{REGISTRY_HOST_SUFFIX}")
}

/// `<region>-docker.pkg.dev/<project>/<repo>/<image>:<tag>`
///
/// A domain-scoped project (`example.com:my-proj`) appears in the path as
/// `example.com/my-proj`.
pub fn image_name(region: &str, project_id: &str, repo: &str, image: &str, tag: &str) -> String {
    format!(
        "{host}/{project}/{repo}/{image}:{tag}",
        host = registry_host(region),
        project = project_id.replace(':', "/")
    )
}

impl BuildContext {
    /// Validate the inputs and derive the full image name.
    pub fn new(
        project_id: &str,
        region: &str,
        repo_artifact: &str,
        image_repo: &str,
        service_name: &str,
        tag: &str,
    ) -> Result<Self> {
        validate_project_id(project_id)?;
        validate_resource("region", region)?;
        validate_resource("service name", service_name)?;
        validate_resource("repository", repo_artifact)?;
        validate_resource("image", image_repo)?;
        validate_tag(tag)?;

        Ok(Self {
            project_id: project_id.to_owned(),
            region: region.to_owned(),
            repo_artifact: repo_artifact.to_owned(),
            image_repo: image_repo.to_owned(),
            service_name: service_name.to_owned(),
            image_name: image_name(region, project_id, repo_artifact, image_repo, tag),
        })
    }

    /// Resolve every name from configuration. Repository and image default
    /// to the service name.
    pub fn from_config(config: &CloudshipConfig, project_dir: &Path) -> Result<Self> {
        let project_id = config.project_id()?;
        let service_name = config.service_name(project_dir)?;
        let repo_artifact = config.artifact.repository.as_deref().unwrap_or(&service_name);
        let image_repo = config.image.name.as_deref().unwrap_or(&service_name);

        Self::new(
            project_id,
            &config.project.region,
            repo_artifact,
            image_repo,
            &service_name,
            &config.image.tag,
        )
    }

    pub fn registry_host(&self) -> String {
        registry_host(&self.region)
    }

    /// Entries persisted to the shared env file, in write order.
    pub fn env_entries(&self) -> [(&'static str, &str); 5] {
        [
            (KEY_REGION, self.region.as_str()),
            (KEY_REPO_ARTIFACT, self.repo_artifact.as_str()),
            (KEY_IMAGE_REPO, self.image_repo.as_str()),
            (KEY_SERVICE_NAME, self.service_name.as_str()),
            (KEY_IMAGE_NAME, self.image_name.as_str()),
        ]
    }

    /// Persist the context. Fails without writing if any key is already present.
    pub fn write_to(&self, env: &EnvFile) -> Result<()> {
        env.append_all(&self.env_entries())
    }

    /// Rebuild a context written by an earlier step.
    ///
    /// Every value is checked again, and `IMAGE_NAME` must be the image name
    /// derived from the other values and `project_id`, followed by a valid tag.
    pub fn read_from(env: &EnvFile, project_id: &str) -> Result<Self> {
        let values = env.read()?;
        let take = |key: &str| {
            values.get(key).cloned().ok_or_else(|| Error::EnvKeyMissing {
                key: key.to_owned(),
                path: env.path().to_path_buf(),
            })
        };

        validate_project_id(project_id)?;
        let region = take(KEY_REGION)?;
        let repo_artifact = take(KEY_REPO_ARTIFACT)?;
        let image_repo = take(KEY_IMAGE_REPO)?;
        let service_name = take(KEY_SERVICE_NAME)?;
        let image = take(KEY_IMAGE_NAME)?;

        validate_resource("region", &region)?;
        validate_resource("service name", &service_name)?;
        validate_resource("repository", &repo_artifact)?;
        validate_resource("image", &image_repo)?;

        let expected_prefix = image_name(&region, project_id, &repo_artifact, &image_repo, "");
        let Some(tag) = image.strip_prefix(expected_prefix.as_str()) else {
            return Err(Error::ImageNameMismatch {
                image_name: image,
                expected_prefix,
                path: env.path().to_path_buf(),
            });
        };
        validate_tag(tag)?;

        Ok(Self {
            project_id: project_id.to_owned(),
            region,
            repo_artifact,
            image_repo,
            service_name,
            image_name: image,
        })
    }
}

// ── Validation ──

fn validate_resource(field: &'static str, value: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidName {
        field,
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.len() > 63 {
        return Err(invalid("must be at most 63 characters"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("only lowercase letters, digits and '-' are allowed"));
    }
    if !value.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if value.ends_with('-') {
        return Err(invalid("must not end with '-'"));
    }
    Ok(())
}

// Domain-scoped projects look like `example.com:my-proj`.
fn validate_project_id(value: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidName {
        field: "project id",
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | ':'))
    {
        return Err(invalid("only lowercase letters, digits, '-', '.' and ':' are allowed"));
    }
    let scoped_ok = match value.split_once(':') {
        Some((domain, name)) => !domain.is_empty() && !name.is_empty() && !name.contains(':'),
        None => true,
    };
    if !scoped_ok {
        return Err(invalid("expected at most one ':' between a domain and a project name"));
    }
    Ok(())
}

fn validate_tag(value: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidName {
        field: "tag",
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.len() > 128 {
        return Err(invalid("must be at most 128 characters"));
    }
    if value.starts_with(['.', '-']) {
        return Err(invalid("must not start with '.' or '-'"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(invalid("only letters, digits, '_', '.' and '-' are allowed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_host_prefixes_region() {
        assert_eq!(registry_host("europe-west1"), "europe-west1-docker.pkg.dev");
    }

    #[test]
    fn resource_rejects_trailing_hyphen() {
        assert!(validate_resource("repository", "repo-").is_err());
    }

    #[test]
    fn resource_rejects_leading_digit() {
        assert!(validate_resource("service name", "1api").is_err());
    }

    #[test]
    fn domain_scoped_project_becomes_path_segments() {
        assert!(validate_project_id("example.com:my-proj").is_ok());
        assert_eq!(
            image_name("us-east1", "example.com:my-proj", "repo", "img", "latest"),
            "us-east1-docker.pkg.dev/example.com/my-proj/repo/img:latest"
        );
    }

    #[test]
    fn project_id_rejects_bare_or_repeated_colon() {
        assert!(validate_project_id(":my-proj").is_err());
        assert!(validate_project_id("example.com:").is_err());
        assert!(validate_project_id("a:b:c").is_err());
    }

    #[test]
    fn tag_rejects_colon() {
        assert!(validate_tag("v1:2").is_err());
    }
}
