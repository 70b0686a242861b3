use crate::executor::{CliExecutor, RealExecutor};
use crate::tool::ToolError;
use std::path::{Path, PathBuf};

/// Container build and push through the docker CLI.
pub struct DockerClient<E: CliExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::docker(),
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CliExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Client version, used by `cloudship doctor`.
    pub async fn version(&self) -> Result<String, ToolError> {
        let out = self
            .executor
            .exec(&[
                "version".to_owned(),
                "--format".to_owned(),
                "{{.Client.Version}}".to_owned(),
            ])
            .await?;
        Ok(out.trim().to_owned())
    }

    /// `docker build --network <network> -t <image> <context>`
    pub async fn build(&self, image: &str, context: &Path, network: &str) -> Result<(), BuildError> {
        let context_str = context
            .to_str()
            .ok_or_else(|| BuildError::InvalidPath(context.to_path_buf()))?;

        self.executor
            .exec_streaming(&[
                "build".to_owned(),
                "--network".to_owned(),
                network.to_owned(),
                "-t".to_owned(),
                image.to_owned(),
                context_str.to_owned(),
            ])
            .await
            .map_err(|e| BuildError::Build {
                image: image.to_owned(),
                source: e,
            })
    }

    pub async fn push(&self, image: &str) -> Result<(), BuildError> {
        self.executor
            .exec_streaming(&["push".to_owned(), image.to_owned()])
            .await
            .map_err(|e| BuildError::Push {
                image: image.to_owned(),
                source: e,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("docker build of {image} failed")]
    Build { image: String, source: ToolError },

    #[error("docker push of {image} failed")]
    Push { image: String, source: ToolError },
}
