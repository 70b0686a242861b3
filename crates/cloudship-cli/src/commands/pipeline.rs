use anyhow::Context;
use cloudship_cloud::{CliExecutor, DockerClient, EnsureOutcome, GcloudClient};
use cloudship_core::{BuildContext, CloudshipConfig};
use std::fmt;
use std::path::Path;

/// Position in the pipeline. Steps run strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    ComputeNaming,
    EnsureRepository,
    BuildPush,
    Deploy,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::ComputeNaming,
        Step::EnsureRepository,
        Step::BuildPush,
        Step::Deploy,
    ];

    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::ComputeNaming => "compute naming",
            Step::EnsureRepository => "ensure repository",
            Step::BuildPush => "build & push",
            Step::Deploy => "deploy",
        }
    }

    /// Print the `[n/4]` progress line. Progress goes to stderr so
    /// `step naming` can print `KEY=VALUE` lines on stdout.
    fn announce(self, message: &str) {
        eprintln!("[{}/{}] {message}", self.number(), Self::ALL.len());
        tracing::debug!(step = self.label(), "starting");
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {}/{} ({})",
            self.number(),
            Self::ALL.len(),
            self.label()
        )
    }
}

/// Result of a successful pipeline run.
pub(crate) struct DeployOutcome {
    pub context: BuildContext,
    pub repository: EnsureOutcome,
    pub url: String,
}

/// Build-and-deploy orchestrator.
///
/// Each step can run on its own (one process per step, names handed over
/// through the env file) or all together through [`Pipeline::run`], where
/// the [`BuildContext`] is computed once and borrowed by every later step.
pub(crate) struct Pipeline<'a, G: CliExecutor, D: CliExecutor> {
    config: &'a CloudshipConfig,
    project_dir: &'a Path,
    gcloud: &'a GcloudClient<G>,
    docker: &'a DockerClient<D>,
}

impl<'a, G: CliExecutor, D: CliExecutor> Pipeline<'a, G, D> {
    pub fn new(
        config: &'a CloudshipConfig,
        project_dir: &'a Path,
        gcloud: &'a GcloudClient<G>,
        docker: &'a DockerClient<D>,
    ) -> Self {
        Self {
            config,
            project_dir,
            gcloud,
            docker,
        }
    }

    /// Run all four steps. The first failure aborts the run; side effects of
    /// earlier steps (a created repository, a pushed image) are kept.
    pub async fn run(&self) -> anyhow::Result<DeployOutcome> {
        let context = self.compute_naming()?;
        let repository = self.ensure_repository(&context).await?;
        self.build_and_push(&context).await?;
        let url = self.deploy(&context).await?;

        Ok(DeployOutcome {
            context,
            repository,
            url,
        })
    }

    pub fn compute_naming(&self) -> anyhow::Result<BuildContext> {
        let step = Step::ComputeNaming;
        step.announce("Computing resource names...");

        let context = BuildContext::from_config(self.config, self.project_dir)
            .with_context(|| format!("{step} failed"))?;
        tracing::info!(image = %context.image_name, service = %context.service_name, "names computed");
        Ok(context)
    }

    pub async fn ensure_repository(&self, ctx: &BuildContext) -> anyhow::Result<EnsureOutcome> {
        let step = Step::EnsureRepository;
        step.announce("Ensuring Artifact Registry repository...");

        let outcome = self
            .gcloud
            .ensure_repository(ctx, &self.config.artifact)
            .await
            .with_context(|| format!("{step} failed"))?;

        match outcome {
            EnsureOutcome::AlreadyExists => eprintln!(
                "      Repository {} already exists in {}",
                ctx.repo_artifact, ctx.region
            ),
            EnsureOutcome::Created => eprintln!(
                "      Created repository {} in {}",
                ctx.repo_artifact, ctx.region
            ),
        }
        Ok(outcome)
    }

    pub async fn build_and_push(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        let step = Step::BuildPush;
        step.announce(&format!("Building and pushing {}...", ctx.image_name));

        let image = &self.config.image;
        if image.configure_auth {
            self.gcloud
                .configure_docker(&ctx.registry_host())
                .await
                .with_context(|| format!("{step} failed"))?;
        }

        let build_context = self.project_dir.join(&image.context);
        self.docker
            .build(&ctx.image_name, &build_context, &image.network)
            .await
            .with_context(|| format!("{step} failed"))?;
        self.docker
            .push(&ctx.image_name)
            .await
            .with_context(|| format!("{step} failed"))?;

        tracing::info!(image = %ctx.image_name, "image pushed");
        Ok(())
    }

    pub async fn deploy(&self, ctx: &BuildContext) -> anyhow::Result<String> {
        let step = Step::Deploy;
        step.announce(&format!(
            "Deploying {} to Cloud Run ({})...",
            ctx.service_name, ctx.region
        ));

        let url = self
            .gcloud
            .deploy_service(ctx, &self.config.service)
            .await
            .with_context(|| format!("{step} failed"))?;

        tracing::info!(service = %ctx.service_name, %url, "service deployed");
        Ok(url)
    }
}
