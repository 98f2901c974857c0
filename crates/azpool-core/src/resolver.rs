//! VMからパブリックIPアドレスへの解決

use crate::ensure::Provisioner;
use crate::error::{ProvisionError, Result};
use crate::operation::cancellable;
use azpool_cloud::{CloudError, NetworkInterface, PublicIp, ResourceKind, VmRecord};
use tokio_util::sync::CancellationToken;

impl Provisioner<'_> {
    /// `vm` の先頭のネットワークインターフェース経由でパブリックIPを解決
    ///
    /// インターフェースはVMドキュメントの並び順で扱い、primaryフラグは見ない。
    /// NICとIPはどちらもこのリソースグループ内で短い名前で引く。
    pub async fn resolve_public_ip(
        &self,
        cancel: &CancellationToken,
        vm: &VmRecord,
    ) -> Result<PublicIp> {
        let nic_ref = vm
            .network_interfaces
            .first()
            .ok_or_else(|| ProvisionError::NoNetworkInterface {
                vm: vm.name.clone(),
            })?;

        if let Some(primary) = vm.primary_nic().filter(|p| p.id != nic_ref.id) {
            tracing::debug!(
                "VM '{}' flags {} as primary; resolving through the first NIC {} instead",
                vm.name,
                primary.id,
                nic_ref.id
            );
        }

        let nic_name = nic_ref.id.short_name();
        let nic_id = self.resource_id(ResourceKind::NetworkInterface, nic_name);
        tracing::debug!("Resolving public IP of '{}' via NIC {}", vm.name, nic_id);

        let nic_fetch_error = |source: CloudError| ProvisionError::NicFetch {
            vm: vm.name.clone(),
            nic_id: nic_ref.id.clone(),
            source,
        };
        let document = cancellable(
            cancel,
            self.provider()
                .get_resource(&nic_id, ResourceKind::NetworkInterface.api_version()),
        )
        .await?
        .map_err(nic_fetch_error)?;
        let nic = NetworkInterface::from_document(&document).map_err(nic_fetch_error)?;

        let public_ip_ref = nic
            .ip_configurations
            .iter()
            .find_map(|c| c.public_ip_id.as_ref())
            .ok_or_else(|| ProvisionError::NoPublicIp {
                nic: nic.resource.name.clone(),
            })?;

        let public_ip_id =
            self.resource_id(ResourceKind::PublicIpAddress, public_ip_ref.short_name());
        let ip_fetch_error = |source: CloudError| ProvisionError::PublicIpFetch {
            public_ip_id: public_ip_ref.clone(),
            source,
        };
        let document = cancellable(
            cancel,
            self.provider()
                .get_resource(&public_ip_id, ResourceKind::PublicIpAddress.api_version()),
        )
        .await?
        .map_err(ip_fetch_error)?;
        PublicIp::from_document(&document).map_err(ip_fetch_error)
    }
}
