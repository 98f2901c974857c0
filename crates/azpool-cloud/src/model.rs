//! Typed views of the compute and network documents the pipeline walks

use crate::error::{CloudError, Result};
use crate::resource::{ResourceId, ResourceRef};
use serde::{Deserialize, Serialize};

/// Whether a VM was created by this run or already existed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmOrigin {
    New,
    Existing,
}

impl std::fmt::Display for VmOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmOrigin::New => write!(f, "new"),
            VmOrigin::Existing => write!(f, "existing"),
        }
    }
}

/// Reference from a VM's network profile to a network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicReference {
    pub id: ResourceId,

    /// Primary flag as set at creation time, if the service reports it
    pub primary: Option<bool>,
}

/// Virtual machine metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmRecord {
    pub id: ResourceId,
    pub name: String,
    pub location: String,

    /// Network profile, in service order
    pub network_interfaces: Vec<NicReference>,

    pub origin: VmOrigin,
}

impl VmRecord {
    pub fn from_document(document: &serde_json::Value, origin: VmOrigin) -> Result<Self> {
        let doc: VmDocument = parse(document, "virtual machine")?;
        let network_interfaces = doc
            .properties
            .network_profile
            .map(|p| p.network_interfaces)
            .unwrap_or_default()
            .into_iter()
            .map(|nic| NicReference {
                id: nic.id,
                primary: nic.properties.and_then(|p| p.primary),
            })
            .collect();

        Ok(Self {
            id: doc.id,
            name: doc.name,
            location: doc.location,
            network_interfaces,
            origin,
        })
    }

    /// The interface flagged primary, if any
    pub fn primary_nic(&self) -> Option<&NicReference> {
        self.network_interfaces
            .iter()
            .find(|nic| nic.primary == Some(true))
    }
}

/// One IP configuration of a network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfiguration {
    pub name: String,
    pub subnet_id: Option<ResourceId>,
    pub public_ip_id: Option<ResourceId>,
}

/// Network interface metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub resource: ResourceRef,

    /// IP configurations, in service order
    pub ip_configurations: Vec<IpConfiguration>,
}

impl NetworkInterface {
    pub fn from_document(document: &serde_json::Value) -> Result<Self> {
        let doc: NicDocument = parse(document, "network interface")?;
        let ip_configurations = doc
            .properties
            .ip_configurations
            .into_iter()
            .map(|c| {
                let props = c.properties.unwrap_or_default();
                IpConfiguration {
                    name: c.name,
                    subnet_id: props.subnet.map(|s| s.id),
                    public_ip_id: props.public_ip_address.map(|p| p.id),
                }
            })
            .collect();

        Ok(Self {
            resource: ResourceRef {
                id: doc.id,
                name: doc.name,
                location: doc.location,
            },
            ip_configurations,
        })
    }
}

/// Public IP address resource and its current address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIp {
    pub resource: ResourceRef,

    /// Assigned address; may be absent while allocation is pending
    pub ip_address: Option<String>,
}

impl PublicIp {
    pub fn from_document(document: &serde_json::Value) -> Result<Self> {
        let doc: PublicIpDocument = parse(document, "public IP address")?;
        Ok(Self {
            resource: ResourceRef {
                id: doc.id,
                name: doc.name,
                location: doc.location,
            },
            ip_address: doc.properties.ip_address,
        })
    }
}

/// Network resources created together for a new VM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStack {
    pub subnet: ResourceRef,
    pub public_ip: PublicIp,
    pub nic: ResourceRef,
}

fn parse<T: serde::de::DeserializeOwned>(document: &serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(document.clone())
        .map_err(|e| CloudError::InvalidDocument(format!("{}: {}", what, e)))
}

// Wire shapes of the ARM documents. Only the fields the pipeline reads.

#[derive(Deserialize)]
struct VmDocument {
    id: ResourceId,
    name: String,
    location: String,
    #[serde(default)]
    properties: VmProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VmProperties {
    #[serde(default)]
    network_profile: Option<NetworkProfile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkProfile {
    #[serde(default)]
    network_interfaces: Vec<NicReferenceDocument>,
}

#[derive(Deserialize)]
struct NicReferenceDocument {
    id: ResourceId,
    #[serde(default)]
    properties: Option<NicReferenceProperties>,
}

#[derive(Deserialize)]
struct NicReferenceProperties {
    #[serde(default)]
    primary: Option<bool>,
}

#[derive(Deserialize)]
struct NicDocument {
    id: ResourceId,
    name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    properties: NicProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NicProperties {
    #[serde(default)]
    ip_configurations: Vec<IpConfigurationDocument>,
}

#[derive(Deserialize)]
struct IpConfigurationDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    properties: Option<IpConfigurationProperties>,
}

#[derive(Deserialize, Default)]
struct IpConfigurationProperties {
    #[serde(default)]
    subnet: Option<SubResource>,
    #[serde(rename = "publicIPAddress", default)]
    public_ip_address: Option<SubResource>,
}

#[derive(Deserialize)]
struct SubResource {
    id: ResourceId,
}

#[derive(Deserialize)]
struct PublicIpDocument {
    id: ResourceId,
    name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    properties: PublicIpProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PublicIpProperties {
    #[serde(default)]
    ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vm_record_keeps_nic_order_and_primary_flag() {
        let doc = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/render-01",
            "name": "render-01",
            "location": "westeurope",
            "properties": {
                "networkProfile": {
                    "networkInterfaces": [
                        {"id": "/x/networkInterfaces/second"},
                        {"id": "/x/networkInterfaces/first", "properties": {"primary": true}}
                    ]
                }
            }
        });

        let vm = VmRecord::from_document(&doc, VmOrigin::Existing).unwrap();
        assert_eq!(vm.name, "render-01");
        assert_eq!(vm.origin, VmOrigin::Existing);
        assert_eq!(vm.network_interfaces.len(), 2);
        assert_eq!(vm.network_interfaces[0].id.short_name(), "second");
        assert_eq!(vm.network_interfaces[0].primary, None);
        assert_eq!(vm.primary_nic().unwrap().id.short_name(), "first");
    }

    #[test]
    fn test_vm_record_without_network_profile() {
        let doc = json!({"id": "/x/virtualMachines/bare", "name": "bare", "location": "eastus"});
        let vm = VmRecord::from_document(&doc, VmOrigin::New).unwrap();
        assert!(vm.network_interfaces.is_empty());
        assert!(vm.primary_nic().is_none());
        assert_eq!(vm.location, "eastus");
    }

    #[test]
    fn test_network_interface_ip_configurations() {
        let doc = json!({
            "id": "/x/networkInterfaces/render-01-nic",
            "name": "render-01-nic",
            "location": "westeurope",
            "properties": {
                "ipConfigurations": [
                    {"name": "private-only", "properties": {"subnet": {"id": "/x/subnets/default"}}},
                    {"name": "with-public", "properties": {
                        "subnet": {"id": "/x/subnets/default"},
                        "publicIPAddress": {"id": "/x/publicIPAddresses/render-01-ip"}
                    }}
                ]
            }
        });

        let nic = NetworkInterface::from_document(&doc).unwrap();
        assert_eq!(nic.ip_configurations.len(), 2);
        assert!(nic.ip_configurations[0].public_ip_id.is_none());
        assert_eq!(
            nic.ip_configurations[1]
                .public_ip_id
                .as_ref()
                .map(|id| id.short_name()),
            Some("render-01-ip")
        );
    }

    #[test]
    fn test_public_ip_address() {
        let doc = json!({
            "id": "/x/publicIPAddresses/render-01-ip",
            "name": "render-01-ip",
            "location": "westeurope",
            "properties": {"ipAddress": "20.1.2.3", "provisioningState": "Succeeded"}
        });
        let ip = PublicIp::from_document(&doc).unwrap();
        assert_eq!(ip.ip_address.as_deref(), Some("20.1.2.3"));
        assert_eq!(ip.resource.name, "render-01-ip");
    }

    #[test]
    fn test_invalid_vm_document() {
        let err = VmRecord::from_document(&json!({"name": "x"}), VmOrigin::New).unwrap_err();
        assert!(matches!(err, CloudError::InvalidDocument(_)));
    }
}
