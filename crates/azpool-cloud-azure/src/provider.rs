//! Azure provider implementation

use crate::az::{Az, management_url};
use crate::error::AzError;
use async_trait::async_trait;
use azpool_cloud::{AuthStatus, CloudProvider, Page, PageRequest, ResourceId};

/// Azure provider backed by the az CLI
pub struct AzureCloudProvider {
    az: Az,
}

impl AzureCloudProvider {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            az: Az::new(subscription_id),
        }
    }

    fn page_url(request: &PageRequest) -> String {
        match request {
            PageRequest::First { path, api_version } => management_url(path, api_version),
            PageRequest::Next(link) => link.clone(),
        }
    }
}

#[async_trait]
impl CloudProvider for AzureCloudProvider {
    fn name(&self) -> &str {
        "azure-cli"
    }

    fn display_name(&self) -> &str {
        "Microsoft Azure"
    }

    async fn check_auth(&self) -> azpool_cloud::Result<AuthStatus> {
        match self.az.check_auth().await {
            Ok(account) => {
                if account.id != self.az.subscription_id() {
                    return Ok(AuthStatus::failed(format!(
                        "az is logged in to subscription {} instead of {}",
                        account.id,
                        self.az.subscription_id()
                    )));
                }
                let account_info = match account.user {
                    Some(user) => format!("{} ({}) as {}", account.name, account.id, user.name),
                    None => format!("{} ({})", account.name, account.id),
                };
                Ok(AuthStatus::ok(account_info))
            }
            Err(AzError::AzNotFound) => Ok(AuthStatus::failed("az CLI is not installed")),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn get_resource(
        &self,
        id: &ResourceId,
        api_version: &str,
    ) -> azpool_cloud::Result<serde_json::Value> {
        let url = management_url(id.as_str(), api_version);
        Ok(self.az.rest_get(&url).await?)
    }

    async fn put_resource(
        &self,
        id: &ResourceId,
        api_version: &str,
        body: &serde_json::Value,
    ) -> azpool_cloud::Result<serde_json::Value> {
        let url = management_url(id.as_str(), api_version);
        Ok(self.az.rest_put(&url, body).await?)
    }

    async fn invoke_action(
        &self,
        id: &ResourceId,
        api_version: &str,
        action: &str,
    ) -> azpool_cloud::Result<serde_json::Value> {
        let path = format!("{}/{}", id.as_str(), action);
        Ok(self.az.rest_post(&management_url(&path, api_version)).await?)
    }

    async fn list_page(&self, request: &PageRequest) -> azpool_cloud::Result<Page> {
        let url = Self::page_url(request);
        let document = self.az.rest_get(&url).await?;
        let page: Page = serde_json::from_value(document)?;
        tracing::debug!(
            "Fetched page with {} entries (more: {})",
            page.value.len(),
            page.next_link.is_some()
        );
        Ok(page)
    }
}
