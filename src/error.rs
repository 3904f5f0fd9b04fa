use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobLensError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Malformed config document for job '{job}': {reason}")]
    MalformedConfig { job: String, reason: String },

    #[error("No target parameters were supplied")]
    EmptyTargetSet,

    #[error("Repository root is not a directory: {0}")]
    RepositoryRootMissing(PathBuf),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JobLensError>;
