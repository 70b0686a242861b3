pub mod client;
pub mod docker;
pub mod executor;
pub mod tool;

pub use client::{
    ApiCheck, CheckResult, DeployError, DoctorReport, EnsureOutcome, GcloudClient, RegistryError,
    ServiceStatus,
};
pub use docker::{BuildError, DockerClient};
pub use executor::{CliExecutor, RealExecutor};
pub use tool::ToolError;
