use crate::executor::{CliExecutor, RealExecutor};
use crate::tool::ToolError;
use cloudship_core::{ArtifactConfig, BuildContext, LookupPolicy, ServiceConfig};
use serde::Deserialize;
use std::fmt;

/// APIs the pipeline needs enabled on the project.
pub const REQUIRED_APIS: [(&str, &str); 2] = [
    ("Artifact Registry", "artifactregistry.googleapis.com"),
    ("Cloud Run", "run.googleapis.com"),
];

/// GCP operations client, parameterized over the executor for testability.
pub struct GcloudClient<E: CliExecutor = RealExecutor> {
    executor: E,
}

impl GcloudClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::gcloud(),
        }
    }
}

impl Default for GcloudClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CliExecutor> GcloudClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    /// Returns a report with pass/fail for each check item.
    pub async fn doctor(&self, project_id: Option<&str>) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. gcloud CLI
        match self.executor.exec(&args(["version"])).await {
            Ok(v) => {
                // First line reads "Google Cloud SDK X.Y.Z"
                let version = v
                    .lines()
                    .next()
                    .and_then(|line| line.strip_prefix("Google Cloud SDK "))
                    .unwrap_or(v.trim());
                report.gcloud = CheckResult::ok(version.trim());
            }
            Err(e) => report.gcloud = CheckResult::fail(&e.to_string()),
        }

        // 2. Active account
        match self
            .executor
            .exec(&args(["config", "get-value", "account"]))
            .await
        {
            Ok(a) if !a.trim().is_empty() => report.account = CheckResult::ok(a.trim()),
            Ok(_) => report.account = CheckResult::fail("no active account"),
            Err(e) => report.account = CheckResult::fail(&e.to_string()),
        }

        // 3. Project
        let Some(pid) = project_id else {
            report.project = CheckResult::fail("PROJECT_ID not set and no [project].project_id");
            return report;
        };

        match self
            .executor
            .exec(&args([
                "projects",
                "describe",
                pid,
                "--format",
                "value(name)",
            ]))
            .await
        {
            Ok(name) => {
                report.project = CheckResult::ok(&format!("{pid} ({name})", name = name.trim()))
            }
            Err(e) => {
                tracing::debug!(error = %e, "project describe failed");
                report.project = CheckResult::fail(&format!("{pid} — not accessible"));
                return report;
            }
        }

        // 4. Required APIs
        for (label, api) in &REQUIRED_APIS {
            let filter = format!("config.name={api}");
            let result = match self
                .executor
                .exec(&args([
                    "services",
                    "list",
                    "--project",
                    pid,
                    "--filter",
                    &filter,
                    "--format",
                    "value(config.name)",
                ]))
                .await
            {
                Ok(out) if !out.trim().is_empty() => CheckResult::ok("Enabled"),
                Ok(_) => CheckResult::fail("Not enabled"),
                Err(e) => CheckResult::fail(&e.to_string()),
            };

            report.apis.push(ApiCheck {
                name: (*label).to_owned(),
                result,
            });
        }

        report
    }

    // ── Artifact Registry ──

    /// Ensure the Artifact Registry repository exists, creating it if needed.
    ///
    /// A `NOT_FOUND` answer means absent. Other lookup failures abort under
    /// [`LookupPolicy::Strict`] and count as absent under
    /// [`LookupPolicy::Lenient`].
    pub async fn ensure_repository(
        &self,
        ctx: &BuildContext,
        artifact: &ArtifactConfig,
    ) -> Result<EnsureOutcome, RegistryError> {
        let lookup = self
            .executor
            .exec(&args([
                "artifacts",
                "repositories",
                "describe",
                &ctx.repo_artifact,
                "--project",
                &ctx.project_id,
                "--location",
                &ctx.region,
                "--format",
                "value(name)",
            ]))
            .await;

        let exists = match lookup {
            Ok(_) => true,
            Err(e) if e.is_not_found_response() => {
                tracing::debug!(repository = %ctx.repo_artifact, error = %e, "repository not found");
                false
            }
            Err(e) => match artifact.lookup {
                LookupPolicy::Strict => {
                    return Err(RegistryError::Describe {
                        repository: ctx.repo_artifact.clone(),
                        source: e,
                    });
                }
                LookupPolicy::Lenient => {
                    tracing::warn!(
                        repository = %ctx.repo_artifact,
                        error = %e,
                        "repository lookup failed, attempting create"
                    );
                    false
                }
            },
        };

        if exists {
            tracing::info!(
                repository = %ctx.repo_artifact,
                region = %ctx.region,
                "repository already exists"
            );
            return Ok(EnsureOutcome::AlreadyExists);
        }

        self.executor
            .exec(&args([
                "artifacts",
                "repositories",
                "create",
                &ctx.repo_artifact,
                "--project",
                &ctx.project_id,
                "--location",
                &ctx.region,
                "--repository-format",
                &artifact.format,
                "--description",
                &artifact.description,
                "--quiet",
            ]))
            .await
            .map_err(|e| RegistryError::Create {
                repository: ctx.repo_artifact.clone(),
                source: e,
            })?;

        tracing::info!(repository = %ctx.repo_artifact, region = %ctx.region, "repository created");
        Ok(EnsureOutcome::Created)
    }

    /// Register the registry host with docker's credential helper.
    pub async fn configure_docker(&self, registry_host: &str) -> Result<(), RegistryError> {
        self.executor
            .exec(&args(["auth", "configure-docker", registry_host, "--quiet"]))
            .await
            .map_err(|e| RegistryError::ConfigureDocker {
                host: registry_host.to_owned(),
                source: e,
            })?;

        Ok(())
    }

    // ── Cloud Run ──

    /// Deploy the context's image and return the service URL.
    pub async fn deploy_service(
        &self,
        ctx: &BuildContext,
        service: &ServiceConfig,
    ) -> Result<String, DeployError> {
        let access = if service.allow_unauthenticated {
            "--allow-unauthenticated"
        } else {
            "--no-allow-unauthenticated"
        };

        let output = self
            .executor
            .exec(&args([
                "run",
                "deploy",
                &ctx.service_name,
                "--image",
                &ctx.image_name,
                "--project",
                &ctx.project_id,
                "--region",
                &ctx.region,
                "--platform",
                &service.platform,
                access,
                "--quiet",
                "--format",
                "value(status.url)",
            ]))
            .await
            .map_err(|e| DeployError::Deploy {
                service: ctx.service_name.clone(),
                source: e,
            })?;

        Ok(output.trim().to_owned())
    }

    pub async fn describe_service(
        &self,
        service_name: &str,
        project_id: &str,
        region: &str,
    ) -> Result<ServiceStatus, DeployError> {
        let output = self
            .executor
            .exec(&args([
                "run",
                "services",
                "describe",
                service_name,
                "--project",
                project_id,
                "--region",
                region,
                "--format",
                "json",
            ]))
            .await
            .map_err(|e| DeployError::Describe {
                service: service_name.to_owned(),
                source: e,
            })?;

        ServiceStatus::from_json(&output).map_err(|e| DeployError::ParseStatus {
            service: service_name.to_owned(),
            source: e,
        })
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

// ── Result types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyExists,
}

impl EnsureOutcome {
    pub fn created(self) -> bool {
        self == Self::Created
    }
}

/// Subset of `gcloud run services describe --format json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub url: Option<String>,
    pub latest_ready_revision: Option<String>,
    pub ready: bool,
}

#[derive(Deserialize)]
struct ServiceDoc {
    #[serde(default)]
    status: StatusDoc,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusDoc {
    url: Option<String>,
    latest_ready_revision_name: Option<String>,
    #[serde(default)]
    conditions: Vec<ConditionDoc>,
}

#[derive(Deserialize)]
struct ConditionDoc {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

impl ServiceStatus {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: ServiceDoc = serde_json::from_str(json)?;
        let ready = doc
            .status
            .conditions
            .iter()
            .any(|c| c.kind == "Ready" && c.status == "True");

        Ok(Self {
            url: doc.status.url,
            latest_ready_revision: doc.status.latest_ready_revision_name,
            ready,
        })
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URL:      {}", self.url.as_deref().unwrap_or("(none)"))?;
        writeln!(
            f,
            "Revision: {}",
            self.latest_ready_revision.as_deref().unwrap_or("(none)")
        )?;
        write!(f, "Ready:    {}", if self.ready { "yes" } else { "no" })
    }
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub gcloud: CheckResult,
    pub docker: CheckResult,
    pub account: CheckResult,
    pub project: CheckResult,
    pub apis: Vec<ApiCheck>,
    pub config_file: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.gcloud.passed
            && self.docker.passed
            && self.account.passed
            && self.project.passed
            && self.config_file.passed
            && self.apis.iter().all(|a| a.result.passed)
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cloudship doctor")?;
        row(f, "gcloud CLI", &self.gcloud)?;
        row(f, "docker CLI", &self.docker)?;
        row(f, "Account", &self.account)?;
        row(f, "Project", &self.project)?;
        for api in &self.apis {
            row(f, &api.name, &api.result)?;
        }
        row(f, "cloudship.toml", &self.config_file)?;

        if self.all_passed() {
            write!(f, "All checks passed.")
        } else {
            write!(f, "Some checks failed.")
        }
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, check: &CheckResult) -> fmt::Result {
    writeln!(f, "  [{}] {label:<20} {}", check.icon(), check.detail)
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Clone)]
pub struct ApiCheck {
    pub name: String,
    pub result: CheckResult,
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to look up repository '{repository}'")]
    Describe {
        repository: String,
        source: ToolError,
    },

    #[error("failed to create repository '{repository}'")]
    Create {
        repository: String,
        source: ToolError,
    },

    #[error("failed to configure docker credentials for {host}")]
    ConfigureDocker { host: String, source: ToolError },
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("cloud run deployment of '{service}' failed")]
    Deploy { service: String, source: ToolError },

    #[error("failed to describe service '{service}'")]
    Describe { service: String, source: ToolError },

    #[error("unexpected describe output for service '{service}'")]
    ParseStatus {
        service: String,
        source: serde_json::Error,
    },
}
