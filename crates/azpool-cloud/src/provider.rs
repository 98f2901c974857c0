//! Cloud provider trait definition

use crate::error::Result;
use crate::resource::ResourceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cloud provider abstraction trait
///
/// The provisioning pipeline only ever talks to the management plane through
/// this trait. Each call is a single attempt; waiting for long-running
/// operations and cancellation are handled by the caller.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "azure-cli")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Read a single resource document
    async fn get_resource(&self, id: &ResourceId, api_version: &str) -> Result<serde_json::Value>;

    /// Submit a create-or-update request for a resource.
    ///
    /// Returns the document as accepted by the service; its provisioning
    /// state may still be in progress.
    async fn put_resource(
        &self,
        id: &ResourceId,
        api_version: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Invoke a resource action (`POST {id}/{action}`), e.g. `listKeys`
    async fn invoke_action(
        &self,
        id: &ResourceId,
        api_version: &str,
        action: &str,
    ) -> Result<serde_json::Value>;

    /// Fetch one page of a collection listing
    async fn list_page(&self, request: &PageRequest) -> Result<Page>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Which page of a collection to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page of the collection at `path`
    First { path: String, api_version: String },

    /// Continuation link returned by the previous page
    Next(String),
}

impl PageRequest {
    pub fn first(path: impl Into<String>, api_version: impl Into<String>) -> Self {
        PageRequest::First {
            path: path.into(),
            api_version: api_version.into(),
        }
    }
}

/// One page of a collection listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Resource documents on this page, in service order
    #[serde(default)]
    pub value: Vec<serde_json::Value>,

    /// Link to the next page, absent on the last page
    #[serde(rename = "nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

impl Page {
    pub fn last(value: Vec<serde_json::Value>) -> Self {
        Self {
            value,
            next_link: None,
        }
    }

    /// The request for the following page, if there is one
    pub fn next_request(&self) -> Option<PageRequest> {
        self.next_link
            .as_ref()
            .filter(|link| !link.is_empty())
            .map(|link| PageRequest::Next(link.clone()))
    }
}
