use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("project id not set — export PROJECT_ID or set [project].project_id in cloudship.toml")]
    MissingProjectId,

    #[error("cannot derive a service name from {0}; set [service].name in cloudship.toml")]
    NoServiceName(PathBuf),

    // ── Naming ──
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidName {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    // ── Shared env file ──
    #[error("failed to read env file {path}")]
    EnvFileRead {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("failed to write env file {path}")]
    EnvFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{key} is already set in {path}; shared values are write-once")]
    EnvKeyExists { key: String, path: PathBuf },

    #[error("IMAGE_NAME {image_name:?} in {path} does not match the current names (expected {expected_prefix:?}<tag>)")]
    ImageNameMismatch {
        image_name: String,
        expected_prefix: String,
        path: PathBuf,
    },

    #[error("{key} not found in {path} — run `cloudship step naming` first")]
    EnvKeyMissing { key: String, path: PathBuf },

    #[error("cannot write {key} to env file: {reason}")]
    EnvInvalidEntry { key: String, reason: &'static str },
}
