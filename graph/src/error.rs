use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid commit id: {0}")]
    InvalidId(String),

    #[error("Commit not found: {0}")]
    MissingCommit(String),

    #[error("Build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("History build was aborted")]
    BuildAborted,
}
