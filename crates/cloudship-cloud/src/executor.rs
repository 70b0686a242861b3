use crate::tool::ToolError;
use std::process::Stdio;

/// Abstraction over external CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CliExecutor: Send + Sync {
    /// Execute a command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, ToolError>;

    /// Execute a command, streaming output to the terminal.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), ToolError>;
}

/// Runs a fixed program (`gcloud`, `docker`) as a child process.
#[derive(Debug, Clone, Copy)]
pub struct RealExecutor {
    program: &'static str,
}

impl RealExecutor {
    pub const fn new(program: &'static str) -> Self {
        Self { program }
    }

    pub const fn gcloud() -> Self {
        Self::new("gcloud")
    }

    pub const fn docker() -> Self {
        Self::new("docker")
    }

    pub fn program(&self) -> &'static str {
        self.program
    }
}

impl CliExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, ToolError> {
        tracing::debug!(program = self.program, ?args, "capturing");

        let output = tokio::process::Command::new(self.program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ToolError::NotFound {
                program: self.program,
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ToolError::InvalidUtf8 {
                program: self.program,
                source: e,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(ToolError::CommandFailed {
                program: self.program,
                args: args.to_vec(),
                stderr,
            })
        }
    }

    async fn exec_streaming(&self, args: &[String]) -> Result<(), ToolError> {
        tracing::debug!(program = self.program, ?args, "running");

        let status = tokio::process::Command::new(self.program)
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ToolError::NotFound {
                program: self.program,
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::CommandFailed {
                program: self.program,
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }
}
