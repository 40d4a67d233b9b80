use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing region: {0}")]
    RegionParseError(String),

    #[error("Error parsing feature: {0}")]
    FeatureParseError(String),

    #[error("Error parsing chrom sizes line: {0}")]
    ChromSizesParseError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
