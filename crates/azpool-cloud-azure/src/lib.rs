//! Azure provider for azpool
//!
//! This crate implements the CloudProvider trait for Microsoft Azure,
//! talking to Azure Resource Manager through the az CLI.
//!
//! # Requirements
//!
//! - `az` CLI must be installed
//! - Authentication is managed through `az login`
//!
//! # Example
//!
//! ```ignore
//! use azpool_cloud::CloudProvider;
//! use azpool_cloud_azure::AzureCloudProvider;
//!
//! let provider = AzureCloudProvider::new("00000000-0000-0000-0000-000000000000");
//!
//! // Check authentication
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//! ```

pub mod az;
pub mod error;
pub mod provider;

pub use az::{Az, AzAccount, MANAGEMENT_ENDPOINT, management_url};
pub use error::{AzError, Result};
pub use provider::AzureCloudProvider;
