use thiserror::Error;

#[derive(Debug, Error)]
pub enum NudgeError {
    #[error("not initialized: run 'nudge init'")]
    NotInitialized,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid user id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidUserId(String),

    #[error("store unavailable: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NudgeError>;
