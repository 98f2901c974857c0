//! プロビジョニング全体の実行
//!
//! リソースグループ、ストレージアカウント、Batchアカウント、VMの順に
//! 選択と確保を行う。最初のエラーで実行を終える。

use crate::ensure::{BatchAccountSpec, Provisioner, ResourceGroupSpec, StorageAccountSpec};
use crate::error::{ProvisionError, Result};
use crate::lifecycle::{VmEvent, VmProvisioning};
use crate::picker::{ChosenName, Prompter, ResourceNamePicker};
use crate::vm::{VirtualMachineSpec, generate_admin_password, load_ssh_key};
use azpool_cloud::{CloudProvider, PublicIp, ResourceKind, ResourceRef, VmOrigin, VmRecord};
use azpool_config::Config;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// 成功した実行が作成または発見したもの
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub resource_group: ResourceRef,
    pub storage_account: ResourceRef,
    pub batch_account: ResourceRef,
    pub vm: VmRecord,
    pub public_ip: PublicIp,
}

pub struct Orchestrator<'a, P> {
    provider: &'a dyn CloudProvider,
    config: &'a Config,
    picker: ResourceNamePicker<P>,
    resource_group: String,
    vm_state: VmProvisioning,
}

impl<'a, P: Prompter> Orchestrator<'a, P> {
    pub fn new(provider: &'a dyn CloudProvider, config: &'a Config, prompter: P) -> Self {
        Self {
            provider,
            config,
            picker: ResourceNamePicker::new(prompter),
            resource_group: config.resource_group.clone(),
            vm_state: VmProvisioning::default(),
        }
    }

    pub fn vm_state(&self) -> VmProvisioning {
        self.vm_state
    }

    pub fn prompter(&self) -> &P {
        self.picker.prompter()
    }

    /// 以降の全ステップが対象とするリソースグループ
    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    fn provisioner(&self) -> Provisioner<'_> {
        Provisioner::new(self.provider, self.config, &self.resource_group)
    }

    /// 全体をプロビジョニング
    pub async fn run(
        &mut self,
        cancel: &CancellationToken,
        vm_override: &str,
    ) -> Result<ProvisionReport> {
        let config = self.config;

        let resource_group = self.ensure_resource_group(cancel).await?;

        let chosen = self
            .choose(cancel, ResourceKind::StorageAccount, &config.storage_account)
            .await?;
        let storage_account = self
            .provisioner()
            .ensure(cancel, &StorageAccountSpec, &chosen.name, chosen.is_existing)
            .await?;

        let chosen = self
            .choose(cancel, ResourceKind::BatchAccount, &config.batch_account)
            .await?;
        let batch_spec = BatchAccountSpec {
            auto_storage: storage_account.id.clone(),
        };
        let batch_account = self
            .provisioner()
            .ensure(cancel, &batch_spec, &chosen.name, chosen.is_existing)
            .await?;

        let chosen = self.choose_vm(cancel, vm_override).await?;
        let (vm, public_ip) = self.ensure_vm(cancel, &chosen).await?;

        Ok(ProvisionReport {
            resource_group,
            storage_account,
            batch_account,
            vm,
            public_ip,
        })
    }

    /// リソースグループを選び、存在を確保
    pub async fn ensure_resource_group(&mut self, cancel: &CancellationToken) -> Result<ResourceRef> {
        let config = self.config;
        let chosen = self
            .choose(cancel, ResourceKind::ResourceGroup, &config.resource_group)
            .await?;
        self.resource_group = chosen.name.clone();

        self.provisioner()
            .ensure(cancel, &ResourceGroupSpec, &chosen.name, chosen.is_existing)
            .await
    }

    /// リージョン内の `kind` の既存リソースを一覧し、名前を選ぶ
    pub async fn choose(
        &self,
        cancel: &CancellationToken,
        kind: ResourceKind,
        override_name: &str,
    ) -> Result<ChosenName> {
        let candidates = self.provisioner().list_in_region(cancel, kind).await?;
        self.picker
            .choose(cancel, kind, &candidates, override_name)
            .await
    }

    /// VM名を選ぶ（`override_name` が空でなければそれを使う）
    pub async fn choose_vm(
        &mut self,
        cancel: &CancellationToken,
        override_name: &str,
    ) -> Result<ChosenName> {
        self.advance(VmEvent::SelectionStarted)?;
        let result = self
            .choose(cancel, ResourceKind::VirtualMachine, override_name)
            .await;
        result.map_err(|e| self.abort(e))
    }

    /// 選んだVMを作成または既存VMを取得し、パブリックIPを求める
    pub async fn ensure_vm(
        &mut self,
        cancel: &CancellationToken,
        chosen: &ChosenName,
    ) -> Result<(VmRecord, PublicIp)> {
        if self.vm_state == VmProvisioning::Unresolved {
            self.advance(VmEvent::SelectionStarted)?;
        }
        self.advance(VmEvent::NameChosen {
            existing: chosen.is_existing,
        })?;

        let result = if chosen.is_existing {
            self.fetch_existing_vm(cancel, &chosen.name).await
        } else {
            self.create_vm(cancel, &chosen.name).await
        };

        match result {
            Ok((vm, public_ip)) => {
                self.advance(VmEvent::PublicIpObtained)?;
                tracing::info!(
                    vm_name = %vm.name,
                    origin = %vm.origin,
                    public_ip = public_ip.ip_address.as_deref().unwrap_or("-"),
                    "VM ready"
                );
                Ok((vm, public_ip))
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    async fn create_vm(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<(VmRecord, PublicIp)> {
        let config = self.config;
        let ssh_public_key = load_ssh_key(&config.vm.ssh_public_key_path())?;

        let provisioner = self.provisioner();
        let stack = provisioner.build_network_stack(cancel, name).await?;

        tracing::info!(
            resource_group = %self.resource_group,
            location = %config.location,
            vm_name = %name,
            "Creating new VM"
        );
        let spec = VirtualMachineSpec {
            vm: &config.vm,
            nic: stack.nic.id.clone(),
            ssh_public_key,
            admin_password: generate_admin_password(),
        };
        let document = provisioner.create(cancel, &spec, name).await?;
        let vm = VmRecord::from_document(&document, VmOrigin::New).map_err(|source| {
            ProvisionError::Creation {
                kind: ResourceKind::VirtualMachine,
                name: name.to_string(),
                source,
            }
        })?;

        Ok((vm, stack.public_ip))
    }

    async fn fetch_existing_vm(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<(VmRecord, PublicIp)> {
        tracing::info!(
            resource_group = %self.resource_group,
            vm_name = %name,
            "Using existing VM"
        );
        let provisioner = self.provisioner();
        let document = provisioner
            .fetch(cancel, ResourceKind::VirtualMachine, name)
            .await?;
        provisioner.checked_ref(ResourceKind::VirtualMachine, name, &document)?;
        let vm = VmRecord::from_document(&document, VmOrigin::Existing).map_err(|source| {
            ProvisionError::lookup(ResourceKind::VirtualMachine, name, source)
        })?;

        let public_ip = provisioner.resolve_public_ip(cancel, &vm).await?;
        Ok((vm, public_ip))
    }

    fn advance(&mut self, event: VmEvent) -> Result<()> {
        let next = self.vm_state.transition(event)?;
        tracing::debug!("VM provisioning: {} -> {}", self.vm_state, next);
        self.vm_state = next;
        Ok(())
    }

    fn abort(&mut self, error: ProvisionError) -> ProvisionError {
        if let Ok(next) = self.vm_state.transition(VmEvent::Failed) {
            tracing::debug!("VM provisioning: {} -> {}", self.vm_state, next);
            self.vm_state = next;
        }
        error
    }
}
