use thiserror::Error;

/// Errors from the rating backend API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, bad TLS...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status; the body is the backend's
    /// plain-text detail (e.g. "Set already exists")
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
