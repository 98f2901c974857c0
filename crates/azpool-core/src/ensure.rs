//! 個々のリソースの取得または作成

use crate::error::{ProvisionError, Result};
use crate::operation::{cancellable, list_all, wait_for_completion};
use azpool_cloud::{CloudProvider, ResourceId, ResourceKind, ResourceRef, collection_path};
use azpool_config::Config;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// リソース種別ごとの作成方法
pub trait ResourceSpec: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// `location` に `name` を作成するリクエストボディ
    fn creation_body(&self, location: &str, name: &str) -> serde_json::Value;
}

/// リソースグループ
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceGroupSpec;

impl ResourceSpec for ResourceGroupSpec {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ResourceGroup
    }

    fn creation_body(&self, location: &str, _name: &str) -> serde_json::Value {
        json!({ "location": location })
    }
}

/// LRSの汎用v2ストレージアカウント
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageAccountSpec;

impl ResourceSpec for StorageAccountSpec {
    fn kind(&self) -> ResourceKind {
        ResourceKind::StorageAccount
    }

    fn creation_body(&self, location: &str, _name: &str) -> serde_json::Value {
        json!({
            "location": location,
            "sku": { "name": "Standard_LRS" },
            "kind": "StorageV2",
            "properties": {}
        })
    }
}

/// アプリケーションパッケージ用ストレージアカウントに紐づくBatchアカウント
#[derive(Debug, Clone)]
pub struct BatchAccountSpec {
    pub auto_storage: ResourceId,
}

impl ResourceSpec for BatchAccountSpec {
    fn kind(&self) -> ResourceKind {
        ResourceKind::BatchAccount
    }

    fn creation_body(&self, location: &str, _name: &str) -> serde_json::Value {
        json!({
            "location": location,
            "properties": {
                "autoStorage": { "storageAccountId": self.auto_storage }
            }
        })
    }
}

/// 1つのリソースグループに対して管理プレーンを操作する
#[derive(Clone, Copy)]
pub struct Provisioner<'a> {
    provider: &'a dyn CloudProvider,
    config: &'a Config,
    resource_group: &'a str,
}

impl<'a> Provisioner<'a> {
    pub fn new(provider: &'a dyn CloudProvider, config: &'a Config, resource_group: &'a str) -> Self {
        Self {
            provider,
            config,
            resource_group,
        }
    }

    pub fn provider(&self) -> &'a dyn CloudProvider {
        self.provider
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn resource_group(&self) -> &'a str {
        self.resource_group
    }

    /// このグループ内の `kind` のリソース `name` のID
    pub fn resource_id(&self, kind: ResourceKind, name: &str) -> ResourceId {
        ResourceId::in_group(
            &self.config.subscription_id,
            self.resource_group,
            kind,
            name,
        )
    }

    /// 設定リージョンにある `kind` の既存リソース名
    pub async fn list_in_region(
        &self,
        cancel: &CancellationToken,
        kind: ResourceKind,
    ) -> Result<Vec<String>> {
        let path = collection_path(&self.config.subscription_id, self.resource_group, kind);
        let documents = list_all(self.provider, cancel, kind, path).await?;

        let mut names = Vec::new();
        for document in &documents {
            let resource = match ResourceRef::from_document(document) {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::warn!("Skipping unreadable {} in listing: {}", kind, e);
                    continue;
                }
            };
            let matches = resource.is_in_region(&self.config.location);
            tracing::debug!(
                name = %resource.name,
                location = resource.location.as_deref().unwrap_or("-"),
                location_matches = matches,
                "found existing {}",
                kind
            );
            if matches {
                names.push(resource.name);
            }
        }
        Ok(names)
    }

    /// リソース `name` を取得し、存在しなければ作成
    pub async fn ensure(
        &self,
        cancel: &CancellationToken,
        spec: &dyn ResourceSpec,
        name: &str,
        is_existing: bool,
    ) -> Result<ResourceRef> {
        let kind = spec.kind();
        if is_existing {
            tracing::info!(
                resource_group = %self.resource_group,
                location = %self.config.location,
                "Using existing {} '{}'",
                kind,
                name
            );
            let document = self.fetch(cancel, kind, name).await?;
            self.checked_ref(kind, name, &document)
        } else {
            tracing::info!(
                resource_group = %self.resource_group,
                location = %self.config.location,
                "Creating new {} '{}'",
                kind,
                name
            );
            let document = self.create(cancel, spec, name).await?;
            ResourceRef::from_document(&document).map_err(|source| ProvisionError::Creation {
                kind,
                name: name.to_string(),
                source,
            })
        }
    }

    /// `kind` のリソース `name` のドキュメントを読む
    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        kind: ResourceKind,
        name: &str,
    ) -> Result<serde_json::Value> {
        let id = self.resource_id(kind, name);
        self.fetch_id(cancel, kind, &id, name).await
    }

    pub(crate) async fn fetch_id(
        &self,
        cancel: &CancellationToken,
        kind: ResourceKind,
        id: &ResourceId,
        name: &str,
    ) -> Result<serde_json::Value> {
        cancellable(cancel, self.provider.get_resource(id, kind.api_version()))
            .await?
            .map_err(|source| ProvisionError::lookup(kind, name, source))
    }

    /// `name` の作成リクエストを送信し、完了まで待つ
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        spec: &dyn ResourceSpec,
        name: &str,
    ) -> Result<serde_json::Value> {
        let kind = spec.kind();
        let id = self.resource_id(kind, name);
        let body = spec.creation_body(&self.config.location, name);

        let accepted = cancellable(cancel, self.provider.put_resource(&id, kind.api_version(), &body))
            .await?
            .map_err(|source| ProvisionError::Creation {
                kind,
                name: name.to_string(),
                source,
            })?;

        let document = wait_for_completion(
            self.provider,
            cancel,
            &self.config.operations,
            kind,
            &id,
            name,
            accepted,
        )
        .await?;
        tracing::info!("Created {} '{}'", kind, name);
        Ok(document)
    }

    /// 取得したドキュメントを解析し、設定リージョンにあることを確認
    pub(crate) fn checked_ref(
        &self,
        kind: ResourceKind,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<ResourceRef> {
        let resource = ResourceRef::from_document(document)
            .map_err(|source| ProvisionError::lookup(kind, name, source))?;
        if !resource.is_in_region(&self.config.location) {
            return Err(ProvisionError::WrongRegion {
                kind,
                name: name.to_string(),
                actual: resource.location.unwrap_or_default(),
                expected: self.config.location.clone(),
            });
        }
        Ok(resource)
    }
}
