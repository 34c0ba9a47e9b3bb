use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("SSH connection failed: {0}")]
    SshFailed(String),

    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("railway error: {0}")]
    Railway(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
