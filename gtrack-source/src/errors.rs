use thiserror::Error;

use gtrack_core::FeatureError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Feature reader failed: {0}")]
    ReadError(String),

    #[error("No file path configured for the generic file reader")]
    MissingUrl,

    #[error("Reader task did not complete: {0}")]
    TaskError(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SourceError>;
