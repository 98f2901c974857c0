//! 設定モデル
//!
//! サブスクリプションとリージョン以外は全てデフォルト値を持つ。
//! 最小の `azconfig.json` はこの2つと、再利用または作成するリソース名だけで足りる。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 実行設定。一度だけ読み込み、プロビジョニング中は読み取り専用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub subscription_id: String,

    /// 全リソースが属するリージョン (例: "westeurope")
    pub location: String,

    /// リソースグループ名（空なら対話で決める）
    #[serde(default)]
    pub resource_group: String,

    /// ストレージアカウント名（空なら対話で決める）
    #[serde(default)]
    pub storage_account: String,

    /// Batchアカウント名（空なら対話で決める）
    #[serde(default)]
    pub batch_account: String,

    #[serde(default)]
    pub storage_creds: StorageCredentials,

    #[serde(default)]
    pub vm: VmConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub operations: OperationsConfig,

    /// Batchプールのパラメータ（初回に質問して保存）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchPoolConfig>,

    #[serde(default)]
    pub pool: PoolConfig,
}

/// ストレージアカウントのファイル共有をマウントする認証情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentials {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub size: String,
    pub admin_username: String,

    /// `~/` はホームディレクトリに展開
    pub ssh_public_key_path: String,

    pub image: ImageReference,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            size: "Standard_DS1_v2".to_string(),
            admin_username: "azureuser".to_string(),
            ssh_public_key_path: "~/.ssh/id_rsa.pub".to_string(),
            image: ImageReference::default(),
        }
    }
}

impl VmConfig {
    pub fn ssh_public_key_path(&self) -> PathBuf {
        expand_home(&self.ssh_public_key_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl Default for ImageReference {
    fn default() -> Self {
        Self {
            publisher: "Canonical".to_string(),
            offer: "UbuntuServer".to_string(),
            sku: "18.04-LTS".to_string(),
            version: "latest".to_string(),
        }
    }
}

/// 新規VMを接続する共有仮想ネットワーク
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub virtual_network: String,
    pub subnet: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            virtual_network: "azpool-vnet".to_string(),
            subnet: "default".to_string(),
        }
    }
}

/// 長時間実行オペレーションの待機設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            timeout_secs: 30 * 60,
        }
    }
}

impl OperationsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPoolConfig {
    pub pool_id: String,
    pub vm_size: String,
    #[serde(default)]
    pub target_dedicated_nodes: u32,
    #[serde(default)]
    pub target_low_priority_nodes: u32,
}

impl BatchPoolConfig {
    /// 質問せずにプール作成リクエストを組み立てられるか
    pub fn is_complete(&self) -> bool {
        !self.pool_id.is_empty() && !self.vm_size.is_empty()
    }
}

/// Batchノード起動時の処理
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// 全ノードでマウントするファイル共有
    pub share_name: String,

    /// 全ノードで作成するUnixグループ
    pub unix_group: String,

    /// スタートタスクの最後に実行する共有上のスクリプト
    pub startup_script: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            share_name: "pool-resources".to_string(),
            unix_group: "pool-users".to_string(),
            startup_script: "worker-startup.sh".to_string(),
        }
    }
}

/// 先頭の `~/` をホームディレクトリに展開
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
