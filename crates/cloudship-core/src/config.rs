use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name looked up in the project directory.
pub const CONFIG_FILE: &str = "cloudship.toml";

/// Environment variable carrying the GCP project identifier.
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";

/// Environment variable overriding `[project].region`.
pub const ENV_REGION: &str = "REGION";

/// cloudship.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudshipConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub artifact: ArtifactConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// GCP project ID (PROJECT_ID takes precedence)
    pub project_id: Option<String>,
    /// GCP region (defaults to us-east1)
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Artifact Registry repository (defaults to the service name)
    pub repository: Option<String>,
    /// Repository format passed to `--repository-format`
    #[serde(default = "default_format")]
    pub format: String,
    /// Description attached to a newly created repository
    #[serde(default = "default_description")]
    pub description: String,
    /// How a failed existence check is interpreted
    #[serde(default)]
    pub lookup: LookupPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image name inside the repository (defaults to the service name)
    pub name: Option<String>,
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Network the build containers join
    #[serde(default = "default_network")]
    pub network: String,
    /// Build context directory, relative to the project directory
    #[serde(default = "default_context")]
    pub context: PathBuf,
    /// Register the registry host with docker's credential helper before pushing
    #[serde(default = "default_true")]
    pub configure_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Cloud Run service name (defaults to the project directory name)
    pub name: Option<String>,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_true")]
    pub allow_unauthenticated: bool,
}

/// Interpretation of a failed `artifacts repositories describe`.
///
/// A `NOT_FOUND` response always means the repository is absent. Any other
/// failure is an error under `Strict`, and is treated as absent under
/// `Lenient`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupPolicy {
    #[default]
    Strict,
    Lenient,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: default_region(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            repository: None,
            format: default_format(),
            description: default_description(),
            lookup: LookupPolicy::default(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: None,
            tag: default_tag(),
            network: default_network(),
            context: default_context(),
            configure_auth: true,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: None,
            platform: default_platform(),
            allow_unauthenticated: true,
        }
    }
}

impl CloudshipConfig {
    /// Load from cloudship.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from the project directory, then apply process environment overrides.
    pub fn load_with_env(project_dir: &Path) -> crate::Result<Self> {
        let mut config = Self::load(project_dir)?;
        config.apply_env(|key| {
            std::env::var(key)
                // arch-lint: allow(no-silent-result-drop) reason="an unset or non-UTF-8 variable means no override"
                .ok()
        });
        Ok(config)
    }

    /// Override values with `PROJECT_ID` / `REGION` when the lookup yields a
    /// non-empty value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(project_id) = non_empty(ENV_PROJECT_ID) {
            self.project.project_id = Some(project_id.trim().to_owned());
        }
        if let Some(region) = non_empty(ENV_REGION) {
            self.project.region = region.trim().to_owned();
        }
    }

    pub fn project_id(&self) -> crate::Result<&str> {
        self.project
            .project_id
            .as_deref()
            .ok_or(crate::Error::MissingProjectId)
    }

    /// Service name, falling back to the project directory's name.
    pub fn service_name(&self, project_dir: &Path) -> crate::Result<String> {
        if let Some(name) = &self.service.name {
            return Ok(name.clone());
        }

        let resolved = match std::fs::canonicalize(project_dir) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, dir = %project_dir.display(), "cannot canonicalize project dir");
                project_dir.to_path_buf()
            }
        };
        resolved
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| crate::Error::NoServiceName(project_dir.to_path_buf()))
    }
}

fn default_region() -> String {
    "us-east1".to_owned()
}

fn default_format() -> String {
    "DOCKER".to_owned()
}

fn default_description() -> String {
    "Docker repository".to_owned()
}

fn default_tag() -> String {
    "latest".to_owned()
}

fn default_network() -> String {
    "cloudbuild".to_owned()
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_platform() -> String {
    "managed".to_owned()
}

fn default_true() -> bool {
    true
}
