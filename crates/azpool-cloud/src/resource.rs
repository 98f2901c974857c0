//! Resource kinds, identifiers and references

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};

/// Kind of resource the pipeline provisions or looks up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    StorageAccount,
    BatchAccount,
    VirtualMachine,
    Subnet,
    PublicIpAddress,
    NetworkInterface,
}

impl ResourceKind {
    /// ARM API version used for every call on this kind
    pub fn api_version(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "2021-04-01",
            ResourceKind::StorageAccount => "2023-01-01",
            ResourceKind::BatchAccount => "2023-05-01",
            ResourceKind::VirtualMachine => "2023-03-01",
            ResourceKind::Subnet
            | ResourceKind::PublicIpAddress
            | ResourceKind::NetworkInterface => "2023-04-01",
        }
    }

    /// Provider namespace and resource type segment, `None` for resource groups
    fn provider_type(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ResourceKind::ResourceGroup => None,
            ResourceKind::StorageAccount => Some(("Microsoft.Storage", "storageAccounts")),
            ResourceKind::BatchAccount => Some(("Microsoft.Batch", "batchAccounts")),
            ResourceKind::VirtualMachine => Some(("Microsoft.Compute", "virtualMachines")),
            ResourceKind::Subnet => Some(("Microsoft.Network", "virtualNetworks")),
            ResourceKind::PublicIpAddress => Some(("Microsoft.Network", "publicIPAddresses")),
            ResourceKind::NetworkInterface => Some(("Microsoft.Network", "networkInterfaces")),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::ResourceGroup => write!(f, "resource group"),
            ResourceKind::StorageAccount => write!(f, "storage account"),
            ResourceKind::BatchAccount => write!(f, "batch account"),
            ResourceKind::VirtualMachine => write!(f, "virtual machine"),
            ResourceKind::Subnet => write!(f, "subnet"),
            ResourceKind::PublicIpAddress => write!(f, "public IP address"),
            ResourceKind::NetworkInterface => write!(f, "network interface"),
        }
    }
}

/// Opaque ARM resource identifier
/// (`/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment of the identifier
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn resource_group(subscription_id: &str, name: &str) -> Self {
        Self(format!(
            "/subscriptions/{}/resourceGroups/{}",
            subscription_id, name
        ))
    }

    /// Identifier of a top-level resource inside a resource group.
    ///
    /// Subnets are nested under their virtual network, use [`ResourceId::subnet`].
    pub fn in_group(
        subscription_id: &str,
        resource_group: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Self {
        match kind.provider_type() {
            None => Self::resource_group(subscription_id, name),
            Some((namespace, type_segment)) => Self(format!(
                "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
                subscription_id, resource_group, namespace, type_segment, name
            )),
        }
    }

    pub fn subnet(
        subscription_id: &str,
        resource_group: &str,
        virtual_network: &str,
        subnet: &str,
    ) -> Self {
        Self(format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/virtualNetworks/{}/subnets/{}",
            subscription_id, resource_group, virtual_network, subnet
        ))
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of the collection that lists resources of `kind`.
///
/// Resource groups are listed per subscription, everything else per resource group.
pub fn collection_path(subscription_id: &str, resource_group: &str, kind: ResourceKind) -> String {
    match kind.provider_type() {
        None => format!("/subscriptions/{}/resourcegroups", subscription_id),
        Some((namespace, type_segment)) => format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            subscription_id, resource_group, namespace, type_segment
        ),
    }
}

/// Identifier, display name and region of a created or fetched resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: ResourceId,

    pub name: String,

    /// Region; subnets have none of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ResourceRef {
    pub fn from_document(document: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(document.clone())
            .map_err(|e| CloudError::InvalidDocument(format!("resource reference: {}", e)))
    }

    /// Whether this resource lives in `region`. Region-less resources always match.
    pub fn is_in_region(&self, region: &str) -> bool {
        self.location.as_deref().is_none_or(|l| l == region)
    }
}

/// Provisioning state of a resource document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    Succeeded,
    Failed,
    Canceled,
    /// Creating, Updating, Accepted and friends
    InProgress(String),
}

impl ProvisioningState {
    /// Read `properties.provisioningState`.
    ///
    /// Documents without the field have nothing left to wait on and count as succeeded.
    pub fn from_document(document: &serde_json::Value) -> Self {
        match document
            .pointer("/properties/provisioningState")
            .and_then(|s| s.as_str())
        {
            None => ProvisioningState::Succeeded,
            Some(state) => match state.to_ascii_lowercase().as_str() {
                "succeeded" => ProvisioningState::Succeeded,
                "failed" => ProvisioningState::Failed,
                "canceled" | "cancelled" => ProvisioningState::Canceled,
                _ => ProvisioningState::InProgress(state.to_string()),
            },
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningState::Succeeded => write!(f, "Succeeded"),
            ProvisioningState::Failed => write!(f, "Failed"),
            ProvisioningState::Canceled => write!(f, "Canceled"),
            ProvisioningState::InProgress(state) => write!(f, "{}", state),
        }
    }
}
