use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scoring policy error: {0}")]
    Policy(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
