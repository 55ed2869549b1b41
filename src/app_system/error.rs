use thiserror::Error;

/// Failures while starting or stopping the system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("actor task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
