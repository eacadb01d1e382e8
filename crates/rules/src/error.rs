use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuleError>;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Path is outside the repository: {0}")]
    OutsideRepository(PathBuf),

    #[error("File has no extension: {0}")]
    MissingExtension(PathBuf),

    #[error("Computed pattern is empty for: {0}")]
    EmptyPattern(PathBuf),

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Empty pattern cannot be removed")]
    EmptyRemovalPattern,

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
