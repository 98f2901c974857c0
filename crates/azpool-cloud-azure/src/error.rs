//! Azure provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzError {
    #[error("az CLI not found. Please install: https://learn.microsoft.com/cli/azure/install-azure-cli")]
    AzNotFound,

    #[error("not logged in to Azure (run `az login`): {0}")]
    NotLoggedIn(String),

    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("az command failed: {0}")]
    CommandFailed(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<AzError> for azpool_cloud::CloudError {
    fn from(err: AzError) -> Self {
        use azpool_cloud::CloudError;
        match err {
            AzError::ResourceNotFound(msg) => CloudError::ResourceNotFound(msg),
            AzError::AuthorizationFailed(msg) => CloudError::AccessDenied(msg),
            AzError::NotLoggedIn(msg) => CloudError::AuthenticationFailed(msg),
            AzError::AzNotFound => CloudError::CommandFailed(AzError::AzNotFound.to_string()),
            AzError::CommandFailed(msg) => CloudError::CommandFailed(msg),
            AzError::JsonError(e) => CloudError::Json(e),
            AzError::IoError(e) => CloudError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AzError>;
