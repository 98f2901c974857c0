//! Batchプールのパラメータと全ノードで実行するスタートタスク

use crate::error::{ProvisionError, Result};
use crate::picker::Prompter;
use azpool_cloud::ResourceId;
use azpool_config::{BatchPoolConfig, Config};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const DEFAULT_POOL_VM_SIZE: &str = "Standard_F16s";
const NODE_AGENT_SKU: &str = "batch.node.ubuntu 18.04";

/// 不足しているBatchプールのパラメータを質問して `config` に格納
///
/// `config` が変わって保存が必要かどうかを返す。
pub async fn ask_pool_parameters<P: Prompter>(
    prompter: &P,
    cancel: &CancellationToken,
    config: &mut Config,
) -> Result<bool> {
    if let Some(batch) = config.batch.as_ref().filter(|b| b.is_complete()) {
        tracing::info!(
            pool_id = %batch.pool_id,
            vm_size = %batch.vm_size,
            target_dedicated_nodes = batch.target_dedicated_nodes,
            target_low_priority_nodes = batch.target_low_priority_nodes,
            "batch pool config loaded"
        );
        return Ok(false);
    }

    let pool_id = prompter
        .read_line(cancel, "Desired batch pool ID")
        .await?
        .trim()
        .to_string();
    if pool_id.is_empty() {
        return Err(ProvisionError::EmptyInput {
            what: "batch pool ID".to_string(),
        });
    }

    let vm_size = prompter
        .read_line(
            cancel,
            "Desired batch node VM size, see https://docs.microsoft.com/azure/batch/batch-pool-vm-sizes [Standard_F16s]",
        )
        .await?
        .trim()
        .to_string();
    let vm_size = if vm_size.is_empty() {
        DEFAULT_POOL_VM_SIZE.to_string()
    } else {
        vm_size
    };

    let answer = prompter
        .read_line(cancel, "Target dedicated node count [0]")
        .await?;
    let target_dedicated_nodes = parse_node_count("dedicated node count", &answer)?;

    let answer = prompter
        .read_line(cancel, "Target low-priority node count [0]")
        .await?;
    let target_low_priority_nodes = parse_node_count("low-priority node count", &answer)?;

    config.batch = Some(BatchPoolConfig {
        pool_id,
        vm_size,
        target_dedicated_nodes,
        target_low_priority_nodes,
    });
    Ok(true)
}

/// ノード数の回答を解析（空は0）
pub fn parse_node_count(what: &str, input: &str) -> Result<u32> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0);
    }

    let count: i64 = input.parse().map_err(|_| ProvisionError::InvalidInput {
        what: what.to_string(),
        reason: format!("invalid integer '{}'", input),
    })?;
    if count < 0 {
        return Err(ProvisionError::InvalidInput {
            what: what.to_string(),
            reason: "number of nodes must be non-negative integer".to_string(),
        });
    }
    u32::try_from(count).map_err(|_| ProvisionError::InvalidInput {
        what: what.to_string(),
        reason: format!("{} nodes is too many", count),
    })
}

/// ストレージアカウントのファイル共有用CIFSマウントオプション
pub fn mount_options(config: &Config) -> String {
    format!(
        "vers=3.0,username={},password={},dir_mode=0777,file_mode=0777,serverino",
        config.storage_creds.username, config.storage_creds.password
    )
}

/// プールのスタートタスクとして実行するシェルコマンド
///
/// ファイル共有をマウントしてUnixグループを作り、共有上の
/// スタートアップスクリプトに処理を渡す。
pub fn start_task_command_line(config: &Config) -> String {
    let share = &config.pool.share_name;
    format!(
        "bash -exc 'sudo mkdir -p /mnt/{share}; \
         sudo groupadd --force {group}; \
         sudo mount -t cifs //{account}.file.core.windows.net/{share} /mnt/{share} -o {options}; \
         bash -ex /mnt/{share}/{script}'",
        share = share,
        group = config.pool.unix_group,
        account = config.storage_creds.username,
        options = mount_options(config),
        script = config.pool.startup_script,
    )
}

/// Batchプール作成リクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    pub id: String,
    pub vm_size: String,
    pub max_tasks_per_node: u32,
    pub target_dedicated_nodes: u32,
    pub target_low_priority_nodes: u32,
    pub virtual_machine_configuration: PoolVmConfiguration,
    pub network_configuration: PoolNetworkConfiguration,
    pub start_task: StartTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolVmConfiguration {
    pub image_reference: azpool_config::ImageReference,
    #[serde(rename = "nodeAgentSKUId")]
    pub node_agent_sku_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolNetworkConfiguration {
    pub subnet_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTask {
    pub command_line: String,
    pub wait_for_success: bool,
    pub user_identity: UserIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub auto_user: AutoUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoUser {
    pub scope: String,
    pub elevation_level: String,
}

impl PoolSpec {
    /// `config` の共有サブネット上に `pool` のリクエストを組み立てる
    pub fn from_config(config: &Config, resource_group: &str, pool: &BatchPoolConfig) -> Self {
        Self {
            id: pool.pool_id.clone(),
            vm_size: pool.vm_size.clone(),
            max_tasks_per_node: 1,
            target_dedicated_nodes: pool.target_dedicated_nodes,
            target_low_priority_nodes: pool.target_low_priority_nodes,
            virtual_machine_configuration: PoolVmConfiguration {
                image_reference: azpool_config::ImageReference::default(),
                node_agent_sku_id: NODE_AGENT_SKU.to_string(),
            },
            network_configuration: PoolNetworkConfiguration {
                subnet_id: ResourceId::subnet(
                    &config.subscription_id,
                    resource_group,
                    &config.network.virtual_network,
                    &config.network.subnet,
                ),
            },
            start_task: StartTask {
                command_line: start_task_command_line(config),
                wait_for_success: true,
                user_identity: UserIdentity {
                    auto_user: AutoUser {
                        scope: "pool".to_string(),
                        elevation_level: "admin".to_string(),
                    },
                },
            },
        }
    }
}
