//! 仮想マシンの作成リクエスト

use crate::ensure::ResourceSpec;
use crate::error::{ProvisionError, Result};
use azpool_cloud::{ResourceId, ResourceKind};
use azpool_config::VmConfig;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::json;
use std::path::Path;

const ADMIN_PASSWORD_LENGTH: usize = 32;

/// 作成済みのNICに接続するLinux VM
#[derive(Clone)]
pub struct VirtualMachineSpec<'a> {
    pub vm: &'a VmConfig,
    pub nic: ResourceId,
    pub ssh_public_key: String,
    pub admin_password: String,
}

impl std::fmt::Debug for VirtualMachineSpec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualMachineSpec")
            .field("vm", &self.vm)
            .field("nic", &self.nic)
            .field("ssh_public_key", &self.ssh_public_key)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

impl ResourceSpec for VirtualMachineSpec<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VirtualMachine
    }

    fn creation_body(&self, location: &str, name: &str) -> serde_json::Value {
        let image = &self.vm.image;
        json!({
            "location": location,
            "properties": {
                "hardwareProfile": { "vmSize": self.vm.size },
                "storageProfile": {
                    "imageReference": {
                        "publisher": image.publisher,
                        "offer": image.offer,
                        "sku": image.sku,
                        "version": image.version
                    }
                },
                "osProfile": {
                    "computerName": name,
                    "adminUsername": self.vm.admin_username,
                    "adminPassword": self.admin_password,
                    "linuxConfiguration": {
                        "ssh": {
                            "publicKeys": [{
                                "path": format!("/home/{}/.ssh/authorized_keys", self.vm.admin_username),
                                "keyData": self.ssh_public_key
                            }]
                        }
                    }
                },
                "networkProfile": {
                    "networkInterfaces": [{
                        "id": self.nic,
                        "properties": { "primary": true }
                    }]
                }
            }
        })
    }
}

/// オペレーターのSSH公開鍵を読む
pub fn load_ssh_key(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path).map_err(|source| ProvisionError::SshKey {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(data.trim_end().to_string())
}

/// ランダムな英数字の管理者パスワード（ログインはSSH鍵で行う）
pub fn generate_admin_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ADMIN_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_attaches_nic_as_primary() {
        let vm = VmConfig::default();
        let spec = VirtualMachineSpec {
            vm: &vm,
            nic: ResourceId::new("/x/networkInterfaces/render-01-nic"),
            ssh_public_key: "ssh-rsa AAAA test@host".to_string(),
            admin_password: "secret".to_string(),
        };
        let body = spec.creation_body("westeurope", "render-01");
        let props = &body["properties"];

        assert_eq!(props["hardwareProfile"]["vmSize"], "Standard_DS1_v2");
        assert_eq!(props["storageProfile"]["imageReference"]["offer"], "UbuntuServer");
        assert_eq!(props["osProfile"]["computerName"], "render-01");
        assert_eq!(props["osProfile"]["adminUsername"], "azureuser");
        assert_eq!(
            props["osProfile"]["linuxConfiguration"]["ssh"]["publicKeys"][0]["path"],
            "/home/azureuser/.ssh/authorized_keys"
        );
        assert_eq!(
            props["networkProfile"]["networkInterfaces"][0]["id"],
            "/x/networkInterfaces/render-01-nic"
        );
        assert_eq!(
            props["networkProfile"]["networkInterfaces"][0]["properties"]["primary"],
            true
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let vm = VmConfig::default();
        let spec = VirtualMachineSpec {
            vm: &vm,
            nic: ResourceId::new("/x/networkInterfaces/n"),
            ssh_public_key: String::new(),
            admin_password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", spec);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_load_ssh_key_trims_newline() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("id_rsa.pub");
        std::fs::write(&path, "ssh-rsa AAAA test@host\n").unwrap();

        assert_eq!(load_ssh_key(&path).unwrap(), "ssh-rsa AAAA test@host");
    }

    #[test]
    fn test_load_ssh_key_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = load_ssh_key(&temp_dir.path().join("missing.pub")).unwrap_err();
        assert!(matches!(err, ProvisionError::SshKey { .. }));
    }

    #[test]
    fn test_generate_admin_password() {
        let password = generate_admin_password();
        assert_eq!(password.len(), ADMIN_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_admin_password());
    }
}
