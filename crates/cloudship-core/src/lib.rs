//! Core types and configuration for cloudship.
//!
//! This crate defines the `cloudship.toml` schema ([`CloudshipConfig`]),
//! the naming rules that produce a [`BuildContext`], the append-only
//! shared environment file ([`EnvFile`]), and shared error types.

pub mod config;
pub mod env_file;
pub mod error;
pub mod naming;

pub use config::{
    ArtifactConfig, CloudshipConfig, ImageConfig, LookupPolicy, ProjectConfig, ServiceConfig,
};
pub use env_file::EnvFile;
pub use error::{Error, Result};
pub use naming::{BuildContext, image_name, registry_host};
