use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no request found at or above line {0}")]
    NoRequestFound(usize),

    #[error("import file not found: {}", .0.display())]
    ImportFileNotFound(PathBuf),

    #[error("request execution failed: {0}")]
    RequestExecutionFailed(#[from] reqwest::Error),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to load profile file: {0}")]
    Ini(#[from] ini::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
