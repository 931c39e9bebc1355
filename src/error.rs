use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarPathError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Export Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeline Validation Error: {0}")]
    Validation(String),

    #[error("Engine Invariant Violation: {0}")]
    Invariant(String),
}

pub type SpResult<T> = Result<T, StarPathError>;
