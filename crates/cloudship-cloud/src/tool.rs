#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{program} CLI not found — {hint}", hint = install_hint(program))]
    NotFound {
        program: &'static str,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        program: &'static str,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: &'static str,
        source: std::string::FromUtf8Error,
    },
}

impl ToolError {
    /// Whether the command ran and the service answered that the requested
    /// entity does not exist.
    pub fn is_not_found_response(&self) -> bool {
        match self {
            Self::CommandFailed { stderr, .. } => {
                stderr.contains("NOT_FOUND") || stderr.contains("was not found")
            }
            _ => false,
        }
    }
}

fn install_hint(program: &str) -> &'static str {
    match program {
        "gcloud" => "install: https://cloud.google.com/sdk/docs/install",
        "docker" => "install: https://docs.docker.com/get-docker/",
        _ => "check that it is installed and on PATH",
    }
}
