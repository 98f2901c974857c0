//! スタートタスク用のストレージアカウントキー取得

use crate::ensure::Provisioner;
use crate::error::{ProvisionError, Result};
use crate::operation::cancellable;
use azpool_cloud::{CloudError, CloudProvider, ResourceKind};
use azpool_config::{Config, StorageCredentials};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `listKeys` の応答待ちの上限
pub const KEY_LOOKUP_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<AccountKey>,
}

#[derive(Debug, Deserialize)]
struct AccountKey {
    #[serde(rename = "keyName", default)]
    key_name: String,
    value: String,
}

impl Provisioner<'_> {
    /// ストレージアカウント `name` の先頭のアクセスキーを取得
    ///
    /// ユーザー名はアカウント名そのもの。
    pub async fn storage_credentials(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<StorageCredentials> {
        let kind = ResourceKind::StorageAccount;
        let id = self.resource_id(kind, name);
        let call = cancellable(
            cancel,
            self.provider()
                .invoke_action(&id, kind.api_version(), "listKeys"),
        );

        let document = match tokio::time::timeout(KEY_LOOKUP_DEADLINE, call).await {
            Ok(result) => result?.map_err(|source| ProvisionError::lookup(kind, name, source))?,
            Err(_) => {
                return Err(ProvisionError::Access {
                    kind,
                    name: name.to_string(),
                    source: CloudError::CommandFailed(format!(
                        "no answer to listKeys within {}s",
                        KEY_LOOKUP_DEADLINE.as_secs()
                    )),
                });
            }
        };

        let list: KeyList = serde_json::from_value(document)
            .map_err(|e| ProvisionError::lookup(kind, name, CloudError::Json(e)))?;
        let key = list.keys.into_iter().next().ok_or_else(|| {
            ProvisionError::lookup(
                kind,
                name,
                CloudError::InvalidDocument("no access keys listed".to_string()),
            )
        })?;
        tracing::debug!("Using access key '{}' of storage account '{}'", key.key_name, name);

        Ok(StorageCredentials {
            username: name.to_string(),
            password: key.value,
        })
    }
}

/// 設定に認証情報が無ければストレージアカウントから取得して埋める
///
/// 取得したキーは `config` にだけ入り、ファイルには保存しない。
pub async fn fill_storage_credentials(
    provider: &dyn CloudProvider,
    cancel: &CancellationToken,
    config: &mut Config,
) -> Result<()> {
    let creds = &config.storage_creds;
    if !creds.username.is_empty() && !creds.password.is_empty() {
        tracing::debug!("Using storage credentials from configuration");
        return Ok(());
    }

    for (what, value) in [
        ("resource group", &config.resource_group),
        ("storage account", &config.storage_account),
    ] {
        if value.trim().is_empty() {
            return Err(ProvisionError::EmptyInput {
                what: format!("{} name", what),
            });
        }
    }

    tracing::info!(
        resource_group = %config.resource_group,
        storage_account = %config.storage_account,
        "Fetching storage account key"
    );
    let creds = {
        let current: &Config = config;
        Provisioner::new(provider, current, &current.resource_group)
            .storage_credentials(cancel, &current.storage_account)
            .await?
    };
    config.storage_creds = creds;
    Ok(())
}
