//! azpool cloud abstraction
//!
//! This crate defines the seam between the provisioning pipeline and the
//! cloud management plane, plus the typed resource model both sides share.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   azpool CLI                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  azpool-core                     │
//! │   picker · ensure · network · resolver · run     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 azpool-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ ResourceId   │  │  VmRecord    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────────┐
//! │ azpool-cloud-azure │
//! │   (az CLI)         │
//! └────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod provider;
pub mod resource;

// Re-exports
pub use error::{CloudError, Result};
pub use model::{
    IpConfiguration, NetworkInterface, NetworkStack, NicReference, PublicIp, VmOrigin, VmRecord,
};
pub use provider::{AuthStatus, CloudProvider, Page, PageRequest};
pub use resource::{ProvisioningState, ResourceId, ResourceKind, ResourceRef, collection_path};
