use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Error, Debug)]
pub enum ProjectionError {
    /// A parameter lies outside the domain the engine is defined on.
    #[error("invalid value for '{field}': {reason}")]
    InvalidRange { field: &'static str, reason: String },

    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProjectionError {
    pub(crate) fn invalid_range(field: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidRange {
            field,
            reason: reason.into(),
        }
    }
}
