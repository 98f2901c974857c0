//! azpool プロビジョニングパイプライン
//!
//! リソースグループ、ストレージアカウント、Batchアカウント、パブリックIP付きの
//! Linux VMを順に再利用または作成する。全ての操作は
//! [`CancellationToken`](tokio_util::sync::CancellationToken) を受け取り、
//! プロセスを終了せずに [`ProvisionError`] を返す。

pub mod auth;
pub mod ensure;
pub mod error;
pub mod lifecycle;
pub mod network;
pub mod operation;
pub mod orchestrator;
pub mod picker;
pub mod pool;
pub mod resolver;
pub mod storage;
pub mod vm;

pub use auth::authenticate;
pub use ensure::{
    BatchAccountSpec, Provisioner, ResourceGroupSpec, ResourceSpec, StorageAccountSpec,
};
pub use error::{ErrorCategory, ProvisionError, Result};
pub use lifecycle::{TransitionError, VmEvent, VmProvisioning};
pub use network::{NetworkInterfaceSpec, NetworkNames, PublicIpSpec};
pub use operation::cancellable;
pub use orchestrator::{Orchestrator, ProvisionReport};
pub use picker::{ChosenName, Prompter, ResourceNamePicker, Selection};
pub use pool::{PoolSpec, ask_pool_parameters, parse_node_count, start_task_command_line};
pub use storage::{KEY_LOOKUP_DEADLINE, fill_storage_credentials};
pub use vm::{VirtualMachineSpec, generate_admin_password, load_ssh_key};
