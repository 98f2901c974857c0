//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Invalid resource document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether the provider reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
