use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Structured rejection from the API. `detail` is shown to the user
    /// verbatim.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type AppResult<T> = Result<T, AppError>;
