use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure envelope returned by the API (`"stat": "fail"`).
    /// Displays as the API's own message.
    #[error("{message}")]
    Api { code: Option<i64>, message: String },

    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors caused by the remote service or the network, which a
    /// user retry may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Http(_)
                | AppError::Api { .. }
                | AppError::UnexpectedStatus(_)
                | AppError::MalformedResponse(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
