use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // Guard rejections and server-reported text go straight to the status
    // line, so these two variants carry no prefix.
    #[error("{0}")]
    InvalidQuery(String),

    #[error("{0}")]
    Backend(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    BadResponse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidQuery(_) => "INVALID_QUERY",
            AppError::Backend(_) => "BACKEND_ERROR",
            AppError::Transport(_) => "TRANSPORT_ERROR",
            AppError::BadResponse(_) => "BAD_RESPONSE",
            AppError::Io(_) => "IO_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
