use crate::publish::PublishError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image source error: {0}")]
    Source(anyhow::Error),

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),
}

pub type Result<T> = std::result::Result<T, AppError>;
