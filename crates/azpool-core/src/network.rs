//! 新規VM用のネットワークスタック（共有サブネット、静的パブリックIP、両者を結ぶNIC）

use crate::ensure::{Provisioner, ResourceSpec};
use crate::error::{ProvisionError, Result};
use azpool_cloud::{NetworkStack, PublicIp, ResourceId, ResourceKind, ResourceRef};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// VM名から導出するネットワークリソース名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkNames {
    pub public_ip: String,
    pub nic: String,
    pub ip_configuration: String,
}

impl NetworkNames {
    pub fn for_vm(vm_name: &str) -> Self {
        Self {
            public_ip: format!("{}-ip", vm_name),
            nic: format!("{}-nic", vm_name),
            ip_configuration: format!("{}-ipconfig", vm_name),
        }
    }
}

/// 静的アドレスのStandard SKUパブリックIP
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicIpSpec;

impl ResourceSpec for PublicIpSpec {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PublicIpAddress
    }

    fn creation_body(&self, location: &str, _name: &str) -> serde_json::Value {
        json!({
            "location": location,
            "sku": { "name": "Standard" },
            "properties": {
                "publicIPAllocationMethod": "Static",
                "publicIPAddressVersion": "IPv4"
            }
        })
    }
}

/// `subnet` 上で `public_ip` を持つIP構成が1つのNIC
#[derive(Debug, Clone)]
pub struct NetworkInterfaceSpec {
    pub subnet: ResourceId,
    pub public_ip: ResourceId,
    pub ip_configuration: String,
}

impl ResourceSpec for NetworkInterfaceSpec {
    fn kind(&self) -> ResourceKind {
        ResourceKind::NetworkInterface
    }

    fn creation_body(&self, location: &str, _name: &str) -> serde_json::Value {
        json!({
            "location": location,
            "properties": {
                "ipConfigurations": [{
                    "name": self.ip_configuration,
                    "properties": {
                        "privateIPAllocationMethod": "Dynamic",
                        "subnet": { "id": self.subnet },
                        "publicIPAddress": { "id": self.public_ip }
                    }
                }]
            }
        })
    }
}

impl Provisioner<'_> {
    /// 共有サブネットを確認し、`vm_name` 用のパブリックIPとNICを作成
    ///
    /// どちらのPUTも導出名に対するcreate-or-updateなので、同じVMで中断した
    /// 前回実行の残骸は新しい構成で上書きされる。
    pub async fn build_network_stack(
        &self,
        cancel: &CancellationToken,
        vm_name: &str,
    ) -> Result<NetworkStack> {
        let names = NetworkNames::for_vm(vm_name);
        let network = &self.config().network;

        let subnet_id = ResourceId::subnet(
            &self.config().subscription_id,
            self.resource_group(),
            &network.virtual_network,
            &network.subnet,
        );
        let subnet_name = format!("{}/{}", network.virtual_network, network.subnet);
        let document = self
            .fetch_id(cancel, ResourceKind::Subnet, &subnet_id, &subnet_name)
            .await?;
        let subnet = ResourceRef::from_document(&document)
            .map_err(|source| ProvisionError::lookup(ResourceKind::Subnet, &subnet_name, source))?;
        tracing::debug!("Using subnet {}", subnet.id);

        tracing::info!("Creating public IP address '{}'", names.public_ip);
        let document = self.create(cancel, &PublicIpSpec, &names.public_ip).await?;
        let public_ip = PublicIp::from_document(&document).map_err(|source| {
            ProvisionError::Creation {
                kind: ResourceKind::PublicIpAddress,
                name: names.public_ip.clone(),
                source,
            }
        })?;

        tracing::info!("Creating network interface '{}'", names.nic);
        let nic_spec = NetworkInterfaceSpec {
            subnet: subnet.id.clone(),
            public_ip: public_ip.resource.id.clone(),
            ip_configuration: names.ip_configuration.clone(),
        };
        let document = self.create(cancel, &nic_spec, &names.nic).await?;
        let nic = ResourceRef::from_document(&document).map_err(|source| {
            ProvisionError::Creation {
                kind: ResourceKind::NetworkInterface,
                name: names.nic.clone(),
                source,
            }
        })?;

        Ok(NetworkStack {
            subnet,
            public_ip,
            nic,
        })
    }

}
